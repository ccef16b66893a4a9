//! 值对象（Value Object）
//!
//! 无标识、以值相等为准的对象，用于封装不可变的概念性值与校验逻辑。
//! 约定：值对象只能经由校验构造函数创建，创建成功即代表合法。
//!

/// 值对象抽象
pub trait ValueObject: Sized {
    /// 构造值对象的原始输入
    type Raw;
    /// 业务校验失败时的错误类型
    type Error;

    /// 校验原始输入并创建值对象
    fn parse(raw: Self::Raw) -> Result<Self, Self::Error>;
}
