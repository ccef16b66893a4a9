use bon::Builder;

/// 应用层上下文（Application Context）
///
/// 承载一次应用层调用（命令/查询）所需的横切信息，仅用于日志与追踪，
/// 不参与业务判断：
/// - `correlation_id`：请求链路追踪标识；
/// - `actor_id`：执行者标识（由外部认证层解析后传入）。
///
/// ```rust
/// use outbox_application::context::AppContext;
///
/// let ctx = AppContext::builder()
///     .correlation_id("cor-123".into())
///     .actor_id("u-1".into())
///     .build();
/// assert_eq!(ctx.correlation_id.as_deref(), Some("cor-123"));
/// ```
#[derive(Clone, Debug, Default, Builder)]
pub struct AppContext {
    pub correlation_id: Option<String>,
    pub actor_id: Option<String>,
}
