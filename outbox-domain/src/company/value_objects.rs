//! 公司聚合的值对象
//!
//! 每个值对象只能经由 `ValueObject::parse` 创建，长度按 Unicode 标量计数。
//!
use super::CompanyValidationError;
use crate::value_object::ValueObject;
use std::fmt;
use std::str::FromStr;

const NAME_MAX_CHARS: usize = 15;
const DESCRIPTION_MAX_CHARS: usize = 3000;

/// 公司名称（1..=15 个字符）
///
/// # 示例
///
/// ```
/// use outbox_domain::company::CompanyName;
/// use outbox_domain::value_object::ValueObject;
///
/// assert!(CompanyName::parse("Acme".to_string()).is_ok());
/// assert!(CompanyName::parse(String::new()).is_err());
/// assert!(CompanyName::parse("a".repeat(16)).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CompanyName(String);

impl ValueObject for CompanyName {
    type Raw = String;
    type Error = CompanyValidationError;

    fn parse(raw: String) -> Result<Self, Self::Error> {
        let len = raw.chars().count();
        if len == 0 || len > NAME_MAX_CHARS {
            return Err(CompanyValidationError::InvalidNameLength);
        }
        Ok(Self(raw))
    }
}

impl CompanyName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CompanyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 公司描述（最多 3000 个字符，允许为空）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompanyDescription(String);

impl ValueObject for CompanyDescription {
    type Raw = String;
    type Error = CompanyValidationError;

    fn parse(raw: String) -> Result<Self, Self::Error> {
        if raw.chars().count() > DESCRIPTION_MAX_CHARS {
            return Err(CompanyValidationError::InvalidDescriptionLength);
        }
        Ok(Self(raw))
    }
}

impl CompanyDescription {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// 员工数量（至少 1）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct EmployeesCount(i32);

impl ValueObject for EmployeesCount {
    type Raw = i32;
    type Error = CompanyValidationError;

    fn parse(raw: i32) -> Result<Self, Self::Error> {
        if raw < 1 {
            return Err(CompanyValidationError::InvalidEmployeesCount);
        }
        Ok(Self(raw))
    }
}

impl EmployeesCount {
    pub const fn value(&self) -> i32 {
        self.0
    }
}

/// 公司类型；持久化时使用 1..=4 的整数编码
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompanyType {
    Corporations,
    NonProfit,
    Cooperative,
    SoleProprietorship,
}

impl CompanyType {
    pub const ALL: [CompanyType; 4] = [
        CompanyType::Corporations,
        CompanyType::NonProfit,
        CompanyType::Cooperative,
        CompanyType::SoleProprietorship,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            CompanyType::Corporations => "Corporations",
            CompanyType::NonProfit => "NonProfit",
            CompanyType::Cooperative => "Cooperative",
            CompanyType::SoleProprietorship => "Sole Proprietorship",
        }
    }

    pub const fn code(&self) -> i16 {
        match self {
            CompanyType::Corporations => 1,
            CompanyType::NonProfit => 2,
            CompanyType::Cooperative => 3,
            CompanyType::SoleProprietorship => 4,
        }
    }

    pub fn from_code(code: i16) -> Result<Self, CompanyValidationError> {
        Self::ALL
            .into_iter()
            .find(|t| t.code() == code)
            .ok_or(CompanyValidationError::InvalidCompanyType)
    }
}

impl ValueObject for CompanyType {
    type Raw = String;
    type Error = CompanyValidationError;

    fn parse(raw: String) -> Result<Self, Self::Error> {
        raw.parse()
    }
}

impl FromStr for CompanyType {
    type Err = CompanyValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or(CompanyValidationError::InvalidCompanyType)
    }
}

impl fmt::Display for CompanyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_length_bounds_count_chars_not_bytes() {
        assert!(CompanyName::parse("A".into()).is_ok());
        assert!(CompanyName::parse("123456789012345".into()).is_ok());
        // 15 个多字节字符仍然合法
        assert!(CompanyName::parse("公".repeat(15)).is_ok());
        assert_eq!(
            CompanyName::parse("1234567890123456".into()),
            Err(CompanyValidationError::InvalidNameLength)
        );
        assert_eq!(
            CompanyName::parse(String::new()),
            Err(CompanyValidationError::InvalidNameLength)
        );
    }

    #[test]
    fn description_allows_empty_and_caps_length() {
        assert!(CompanyDescription::parse(String::new()).is_ok());
        assert!(CompanyDescription::parse("a".repeat(3000)).is_ok());
        assert_eq!(
            CompanyDescription::parse("a".repeat(3001)),
            Err(CompanyValidationError::InvalidDescriptionLength)
        );
    }

    #[test]
    fn employees_count_must_be_positive() {
        assert_eq!(EmployeesCount::parse(1).map(|c| c.value()), Ok(1));
        assert_eq!(
            EmployeesCount::parse(0),
            Err(CompanyValidationError::InvalidEmployeesCount)
        );
        assert_eq!(
            EmployeesCount::parse(-1),
            Err(CompanyValidationError::InvalidEmployeesCount)
        );
    }

    #[test]
    fn company_type_string_and_code_agree() {
        for t in CompanyType::ALL {
            assert_eq!(CompanyType::from_code(t.code()), Ok(t));
            assert_eq!(t.as_str().parse::<CompanyType>(), Ok(t));
        }
        assert_eq!(
            "RandomType".parse::<CompanyType>(),
            Err(CompanyValidationError::InvalidCompanyType)
        );
        assert_eq!(
            CompanyType::from_code(999),
            Err(CompanyValidationError::InvalidCompanyType)
        );
    }
}
