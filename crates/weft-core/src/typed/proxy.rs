//! Proxy - remote activity / sub-workflow の宣言と呼び出し
//!
//! # 二層構造
//! - **宣言**: `ActivityProxy` / `WorkflowProxy`。設定（identity, timeouts, retry ...）を持つだけ
//! - **束縛**: `ProxySet` を `WorkflowTask` が受け取り、その Task が占有する Scheduler と結びつける
//!
//! Proxy は束縛後に可変の共有状態を持ちません。呼び出しは `Scheduler` に委譲し、
//! 結果を待たずに `RemoteResult` を返します。

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::codec;
use crate::domain::{
    ActivityConfig, Args, BindingError, RemoteResult, TaskIdentity, WorkflowConfig,
};
use crate::ports::{ActivityCall, Scheduler, SubworkflowCall};

/// Object-safe な proxy の抽象化
///
/// `ProxySet` の中で `Arc<dyn Proxy>` として保持されます。
pub trait Proxy: Send + Sync + fmt::Debug {
    fn identity(&self) -> &TaskIdentity;

    fn invoke(&self, scheduler: &mut dyn Scheduler, args: Args) -> RemoteResult;
}

/// Remote activity の宣言
///
/// # 使用例
/// ```ignore
/// let div = ActivityProxy::new(
///     ActivityConfig::new("Divider", "1").task_list("constant_list"),
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityProxy {
    config: ActivityConfig,
}

impl ActivityProxy {
    pub fn new(config: ActivityConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ActivityConfig {
        &self.config
    }
}

impl From<ActivityConfig> for ActivityProxy {
    fn from(config: ActivityConfig) -> Self {
        Self::new(config)
    }
}

impl Proxy for ActivityProxy {
    fn identity(&self) -> &TaskIdentity {
        self.config.identity()
    }

    fn invoke(&self, scheduler: &mut dyn Scheduler, args: Args) -> RemoteResult {
        scheduler.remote_activity(ActivityCall {
            args,
            args_serializer: codec::serialize_args,
            result_deserializer: codec::deserialize_result,
            config: self.config.clone(),
        })
    }
}

/// Remote sub-workflow の宣言
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowProxy {
    config: WorkflowConfig,
}

impl WorkflowProxy {
    pub fn new(config: WorkflowConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }
}

impl From<WorkflowConfig> for WorkflowProxy {
    fn from(config: WorkflowConfig) -> Self {
        Self::new(config)
    }
}

impl Proxy for WorkflowProxy {
    fn identity(&self) -> &TaskIdentity {
        self.config.identity()
    }

    fn invoke(&self, scheduler: &mut dyn Scheduler, args: Args) -> RemoteResult {
        scheduler.remote_subworkflow(SubworkflowCall {
            args,
            args_serializer: codec::serialize_args,
            result_deserializer: codec::deserialize_result,
            config: self.config.clone(),
        })
    }
}

/// 宣言名 → proxy の対応表
///
/// Workflow が `proxies()` で返し、`WorkflowTask` の生成時に 1 度だけ束縛されます。
///
/// ```ignore
/// let proxies = ProxySet::new()
///     .declare("div", ActivityProxy::new(ActivityConfig::new("Divider", "1")))?
///     .declare("child", WorkflowProxy::new(WorkflowConfig::new("Child", "2")))?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct ProxySet {
    proxies: HashMap<String, Arc<dyn Proxy>>,
}

impl ProxySet {
    pub fn new() -> Self {
        Self {
            proxies: HashMap::new(),
        }
    }

    pub fn declare<P: Proxy + 'static>(
        mut self,
        name: impl Into<String>,
        proxy: P,
    ) -> Result<Self, BindingError> {
        let name = name.into();
        if self.proxies.contains_key(&name) {
            return Err(BindingError::AlreadyDeclared(name));
        }
        self.proxies.insert(name, Arc::new(proxy));
        Ok(self)
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Proxy>> {
        self.proxies.get(name)
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.proxies.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.proxies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.proxies.is_empty()
    }

    /// 宣言名で呼び出す。宣言されていない名前は `BindingError::Unbound`
    pub fn call(
        &self,
        scheduler: &mut dyn Scheduler,
        name: &str,
        args: Args,
    ) -> Result<RemoteResult, BindingError> {
        let proxy = self
            .proxies
            .get(name)
            .ok_or_else(|| BindingError::Unbound(name.to_string()))?;
        Ok(proxy.invoke(scheduler, args))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args;
    use crate::domain::CallOptions;
    use serde_json::json;

    /// 渡された呼び出しを記録するだけの Scheduler
    #[derive(Default)]
    struct RecordingScheduler {
        activities: Vec<ActivityCall>,
        subworkflows: Vec<SubworkflowCall>,
    }

    impl Scheduler for RecordingScheduler {
        fn remote_activity(&mut self, call: ActivityCall) -> RemoteResult {
            self.activities.push(call);
            RemoteResult::Pending
        }

        fn remote_subworkflow(&mut self, call: SubworkflowCall) -> RemoteResult {
            self.subworkflows.push(call);
            RemoteResult::Value(json!("child done"))
        }

        fn suspend(&mut self) {}
        fn fail(&mut self, _reason: &str) {}
        fn finish(&mut self, _result: String) {}
        fn restart(&mut self, _arguments: String) {}
        fn options(&mut self, _overrides: CallOptions) {}
    }

    #[test]
    fn activity_proxy_forwards_config_and_codec() {
        let proxy = ActivityProxy::new(
            ActivityConfig::new("Divider", "1")
                .task_list("constant_list")
                .heartbeat(60),
        );
        let mut scheduler = RecordingScheduler::default();

        let r = proxy.invoke(&mut scheduler, args![77, 2]);
        assert!(r.is_pending());

        let call = &scheduler.activities[0];
        assert_eq!(call.config.identity(), &TaskIdentity::new("Divider", "1"));
        assert_eq!(call.config.task_list_name(), Some("constant_list"));
        assert_eq!(call.config.retries(), 3);
        assert_eq!(call.config.heartbeat_timeout(), Some(60));
        assert_eq!((call.args_serializer)(&call.args).unwrap(), "[[77, 2], {}]");
        assert_eq!((call.result_deserializer)("true").unwrap(), json!(true));
    }

    #[test]
    fn workflow_proxy_uses_subworkflow() {
        let proxy = WorkflowProxy::new(WorkflowConfig::new("Child", "2").workflow_duration(600));
        let mut scheduler = RecordingScheduler::default();

        let r = proxy.invoke(&mut scheduler, args![; "depth" => 1]);
        assert_eq!(r, RemoteResult::Value(json!("child done")));
        assert_eq!(scheduler.subworkflows.len(), 1);
        assert_eq!(scheduler.subworkflows[0].config.workflow_duration_timeout(), Some(600));
    }

    #[test]
    fn negative_retry_and_delay_are_stored_as_zero() {
        let a = ActivityProxy::new(ActivityConfig::new("a", "1").retry(-5).delay(-3));
        assert_eq!(a.config().retries(), 0);
        assert_eq!(a.config().delay_seconds(), 0);

        let w = WorkflowProxy::new(WorkflowConfig::new("w", "1").retry(-5).delay(-3));
        assert_eq!(w.config().retries(), 0);
        assert_eq!(w.config().delay_seconds(), 0);
    }

    #[test]
    fn double_declaration_is_rejected() {
        let set = ProxySet::new()
            .declare("div", ActivityProxy::new(ActivityConfig::new("a", "1")))
            .unwrap();
        let err = set
            .declare("div", ActivityProxy::new(ActivityConfig::new("b", "1")))
            .unwrap_err();
        assert_eq!(err, BindingError::AlreadyDeclared("div".to_string()));
    }

    #[test]
    fn calling_an_undeclared_name_is_a_binding_error() {
        let set = ProxySet::new();
        let mut scheduler = RecordingScheduler::default();
        let err = set.call(&mut scheduler, "div", Args::new()).unwrap_err();
        assert_eq!(err, BindingError::Unbound("div".to_string()));
        assert!(scheduler.activities.is_empty());
    }

    #[test]
    fn names_are_sorted() {
        let set = ProxySet::new()
            .declare("b", ActivityProxy::new(ActivityConfig::new("b", "1")))
            .unwrap()
            .declare("a", WorkflowProxy::new(WorkflowConfig::new("a", "1")))
            .unwrap();
        assert_eq!(set.names(), vec!["a", "b"]);
        assert_eq!(set.len(), 2);
    }
}
