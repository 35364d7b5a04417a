//! Workflow - decision pass ごとに再実行される orchestration のコード
//!
//! # 決定性
//! `run()` は history が増えるたびに最初から実行し直されます。
//! 乱数・現在時刻・外部状態を見て分岐してはいけません。
//! proxy の呼び出し順が history との対応付けの鍵になります。
//!
//! # 戻り値による分岐
//! `Completion` の variant を網羅的に match して、finish / fail / suspend を決めます。
//! - `Plain(v)` / `Remote(Value(v))` → `scheduler.finish(serialize(v))`
//! - `Remote(Failed(r))` / `Remote(TimedOut)` → `scheduler.fail(message)`
//! - `Remote(Pending)` → `scheduler.suspend()`
//! - `Restarted(req)` → `scheduler.restart(req.arguments)`

use async_trait::async_trait;
use serde::Serialize;
use tracing::Span;

use super::codec;
use super::proxy::ProxySet;
use super::task::Task;
use crate::domain::outcome::RestartRequest;
use crate::domain::{
    Args, BindingError, CallOptions, CodecError, Completion, Interrupt, Invocation, Ordered,
    RemoteResult, TaskError,
};
use crate::ports::Scheduler;

/// User が実装する workflow 本体
///
/// # 使用例
/// ```ignore
/// struct PrimeTest;
///
/// impl Workflow for PrimeTest {
///     type Output = String;
///
///     fn proxies(&self) -> Result<ProxySet, BindingError> {
///         ProxySet::new().declare("div", ActivityProxy::new(ActivityConfig::new("Divider", "1")))
///     }
///
///     fn run(&self, ctx: &mut WorkflowContext<'_>, args: Args) -> Result<Completion<String>, Interrupt> {
///         let n: u64 = args.opt_arg(0)?.unwrap_or(77);
///         for i in 2..=n / 2 {
///             if ctx.call("div", args![n, i])?.decode::<bool>().result()? {
///                 return Ok(Completion::plain("not prime".into()));
///             }
///         }
///         Ok(Completion::plain("prime".into()))
///     }
/// }
/// ```
pub trait Workflow: Send {
    type Output: Serialize + Send;

    /// この workflow が使う proxy の宣言（`WorkflowTask` 生成時に 1 度だけ呼ばれる）
    fn proxies(&self) -> Result<ProxySet, BindingError> {
        Ok(ProxySet::new())
    }

    fn run(
        &self,
        ctx: &mut WorkflowContext<'_>,
        args: Args,
    ) -> Result<Completion<Self::Output>, Interrupt>;
}

/// `run()` に渡される、束縛済みの proxy と Scheduler
pub struct WorkflowContext<'a> {
    scheduler: &'a mut dyn Scheduler,
    proxies: &'a ProxySet,
}

impl<'a> WorkflowContext<'a> {
    pub fn new(scheduler: &'a mut dyn Scheduler, proxies: &'a ProxySet) -> Self {
        Self { scheduler, proxies }
    }

    /// 宣言名で remote call を発行する。結果を待たずに返る。
    pub fn call(&mut self, name: &str, args: Args) -> Result<RemoteResult, BindingError> {
        self.proxies.call(&mut *self.scheduler, name, args)
    }

    /// `call` と同じだが、結果が history に記録された位置も返す。
    /// `operations::finish_order` / `parallel_reduce` に渡す用
    pub fn call_ordered(&mut self, name: &str, args: Args) -> Result<Ordered, BindingError> {
        let result = self.call(name, args)?;
        Ok(Ordered::new(result, self.scheduler.resolution_position()))
    }

    /// 次の remote call の設定を上書きする
    pub fn options(&mut self, overrides: CallOptions) {
        self.scheduler.options(overrides);
    }

    /// continue-as-new の要求を作る。返り値を `run()` から返したときだけ restart される。
    ///
    /// ```ignore
    /// return ctx.restart(&args![next_cursor]);
    /// ```
    pub fn restart<T>(&mut self, args: &Args) -> Result<Completion<T>, Interrupt> {
        let arguments = codec::serialize_args(args)?;
        Ok(Completion::Restarted(RestartRequest::new(arguments)))
    }
}

pub struct WorkflowTask<W, S> {
    workflow: W,
    invocation: Invocation,
    scheduler: S,
    proxies: ProxySet,
    span: Span,
}

impl<W: Workflow, S: Scheduler> WorkflowTask<W, S> {
    /// proxy をこの Task の Scheduler に束縛する
    pub fn new(workflow: W, invocation: Invocation, scheduler: S) -> Result<Self, BindingError> {
        let proxies = workflow.proxies()?;
        let span = tracing::info_span!("workflow", token = %invocation.token());
        Ok(Self {
            workflow,
            invocation,
            scheduler,
            proxies,
            span,
        })
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn into_scheduler(self) -> S {
        self.scheduler
    }

    pub fn proxies(&self) -> &ProxySet {
        &self.proxies
    }

    /// 新しい引数で continue-as-new
    pub fn restart(&mut self, args: &Args) -> Result<(), CodecError> {
        let arguments = codec::serialize_args(args)?;
        self.scheduler.restart(arguments);
        Ok(())
    }

    pub fn options(&mut self, overrides: CallOptions) {
        self.scheduler.options(overrides);
    }

    fn finish_value<T: Serialize + ?Sized>(&mut self, value: &T) {
        match codec::serialize_result(value) {
            Ok(result) => self.scheduler.finish(result),
            Err(e) => {
                tracing::error!(error = %e, "could not serialize the workflow result");
                self.scheduler.fail(&e.to_string());
            }
        }
    }

    fn fail_with(&mut self, error: TaskError) {
        tracing::error!(error = %error, "workflow returned a failed result");
        self.scheduler.fail(&error.to_string());
    }
}

#[async_trait]
impl<W: Workflow, S: Scheduler> Task for WorkflowTask<W, S> {
    type Output = Completion<W::Output>;
    type Signal = ();

    fn invocation(&self) -> &Invocation {
        &self.invocation
    }

    fn span(&self) -> &Span {
        &self.span
    }

    async fn run(&mut self, args: Args) -> Result<Completion<W::Output>, Interrupt> {
        let mut ctx = WorkflowContext::new(&mut self.scheduler, &self.proxies);
        self.workflow.run(&mut ctx, args)
    }

    async fn suspend(&mut self) {
        self.scheduler.suspend();
    }

    async fn fail(&mut self, reason: String) {
        self.scheduler.fail(&reason);
    }

    async fn finish(&mut self, result: Completion<W::Output>) {
        match result {
            Completion::Plain(value) => self.finish_value(&value),
            Completion::Remote(RemoteResult::Value(value)) => self.finish_value(&value),
            Completion::Remote(RemoteResult::Pending) => {
                tracing::debug!("workflow returned a pending result");
                self.scheduler.suspend();
            }
            Completion::Remote(RemoteResult::Failed(reason)) => {
                self.fail_with(TaskError::Failed(reason));
            }
            Completion::Remote(RemoteResult::TimedOut) => self.fail_with(TaskError::TimedOut),
            Completion::Restarted(request) => {
                tracing::debug!(arguments = request.arguments(), "continue-as-new");
                self.scheduler.restart(request.into_arguments());
            }
        }
    }
}
