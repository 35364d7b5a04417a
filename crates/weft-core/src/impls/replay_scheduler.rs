//! ReplayScheduler - history から状態を組み立て直す Scheduler
//!
//! # 学習ポイント
//! - remote call は呼び出し順に `CallId` を振り、history のイベントと対応付ける
//! - 解決済みの call は結果を返し、未スケジュールの call だけ decision を積む
//! - 同じ history を replay すれば同じ decision 列になる
//!
//! # 使用例
//! ```ignore
//! let mut history = Vec::new();
//! loop {
//!     let scheduler = ReplayScheduler::new(history);
//!     let mut task = WorkflowTask::new(PrimeTest, invocation.clone(), scheduler)?;
//!     task.invoke().await?;
//!     let mut scheduler = task.into_scheduler();
//!     if scheduler.is_closed() { break; }
//!     // activity を実行して resolve する
//!     history = scheduler.into_history();
//! }
//! ```

use std::collections::{HashMap, HashSet};

use crate::domain::{Args, CallId, CallOptions, Decision, HistoryEvent, RemoteResult};
use crate::ports::{ActivityCall, IdGenerator, Scheduler, SubworkflowCall, SystemClock, UlidGenerator};
use crate::typed::codec::{ArgsSerializer, ResultDeserializer};

pub struct ReplayScheduler<G = UlidGenerator<SystemClock>> {
    history: Vec<HistoryEvent>,
    /// call ごとの結果（wire 形式の文字列のまま）
    resolutions: HashMap<CallId, RemoteResult<String>>,
    /// 結果のイベントが history の何番目か
    positions: HashMap<CallId, u64>,
    last_position: Option<u64>,
    scheduled: HashSet<CallId>,
    next_call: CallId,
    pending_options: Option<CallOptions>,
    decisions: Vec<Decision>,
    ids: G,
}

impl ReplayScheduler {
    pub fn new(history: Vec<HistoryEvent>) -> Self {
        Self::with_id_generator(history, UlidGenerator::new(SystemClock))
    }
}

impl<G: IdGenerator> ReplayScheduler<G> {
    pub fn with_id_generator(history: Vec<HistoryEvent>, ids: G) -> Self {
        let mut scheduler = Self {
            history: Vec::with_capacity(history.len()),
            resolutions: HashMap::new(),
            positions: HashMap::new(),
            last_position: None,
            scheduled: HashSet::new(),
            next_call: CallId::FIRST,
            pending_options: None,
            decisions: Vec::new(),
            ids,
        };
        for event in history {
            scheduler.record(event);
        }
        scheduler
    }

    /// history にイベントを 1 件追加する
    pub fn record(&mut self, event: HistoryEvent) {
        let position = self.history.len() as u64;
        match &event {
            HistoryEvent::Scheduled { call_id, .. } => {
                self.scheduled.insert(*call_id);
            }
            HistoryEvent::Completed { call_id, result } => {
                self.positions.insert(*call_id, position);
                self.resolutions
                    .insert(*call_id, RemoteResult::Value(result.clone()));
            }
            HistoryEvent::Failed { call_id, reason } => {
                self.positions.insert(*call_id, position);
                self.resolutions
                    .insert(*call_id, RemoteResult::Failed(reason.clone()));
            }
            HistoryEvent::TimedOut { call_id } => {
                self.positions.insert(*call_id, position);
                self.resolutions.insert(*call_id, RemoteResult::TimedOut);
            }
        }
        self.history.push(event);
    }

    /// call の結果を history に書き込む。次のパスから見える
    ///
    /// `Pending` は何も書き込まない。
    pub fn resolve(&mut self, call_id: CallId, outcome: RemoteResult<String>) {
        let event = match outcome {
            RemoteResult::Value(result) => HistoryEvent::Completed { call_id, result },
            RemoteResult::Failed(reason) => HistoryEvent::Failed { call_id, reason },
            RemoteResult::TimedOut => HistoryEvent::TimedOut { call_id },
            RemoteResult::Pending => return,
        };
        self.record(event);
    }

    pub fn history(&self) -> &[HistoryEvent] {
        &self.history
    }

    pub fn into_history(self) -> Vec<HistoryEvent> {
        self.history
    }

    /// このパスで積んだ decision（呼び出し順）
    pub fn decisions(&self) -> &[Decision] {
        &self.decisions
    }

    /// このパスで新しく積んだ schedule 系の decision
    pub fn scheduled_calls(&self) -> impl Iterator<Item = &Decision> {
        self.decisions.iter().filter(|d| !d.is_terminal())
    }

    /// finish / fail / suspend / restart のうち最後に積まれたもの
    pub fn terminal(&self) -> Option<&Decision> {
        self.decisions.iter().rev().find(|d| d.is_terminal())
    }

    /// workflow が完了・失敗・restart したら true（suspend は含まない）
    pub fn is_closed(&self) -> bool {
        matches!(
            self.terminal(),
            Some(Decision::Complete { .. } | Decision::Fail { .. } | Decision::Restart { .. })
        )
    }

    fn allocate_call_id(&mut self) -> CallId {
        let id = self.next_call;
        self.next_call = id.next();
        id
    }

    fn take_options(&mut self) -> Option<CallOptions> {
        self.pending_options.take()
    }

    /// 解決済みなら結果を返し、初めての call なら decision を積んで Pending
    fn replay(
        &mut self,
        call_id: CallId,
        args: &Args,
        args_serializer: ArgsSerializer,
        result_deserializer: ResultDeserializer,
        schedule: impl FnOnce(CallId, String) -> Decision,
    ) -> RemoteResult {
        self.last_position = self.positions.get(&call_id).copied();
        if let Some(resolution) = self.resolutions.get(&call_id) {
            return match resolution {
                RemoteResult::Value(text) => match result_deserializer(text) {
                    Ok(value) => RemoteResult::Value(value),
                    Err(e) => {
                        tracing::error!(%call_id, error = %e, "could not decode the remote result");
                        RemoteResult::Failed(e.to_string())
                    }
                },
                RemoteResult::Failed(reason) => RemoteResult::Failed(reason.clone()),
                RemoteResult::TimedOut => RemoteResult::TimedOut,
                RemoteResult::Pending => RemoteResult::Pending,
            };
        }
        if self.scheduled.contains(&call_id) {
            return RemoteResult::Pending;
        }

        let input = match args_serializer(args) {
            Ok(input) => input,
            Err(e) => {
                tracing::error!(%call_id, error = %e, "could not serialize the call arguments");
                return RemoteResult::Failed(e.to_string());
            }
        };
        tracing::debug!(%call_id, "scheduling remote call");
        self.record(HistoryEvent::Scheduled {
            call_id,
            input: input.clone(),
        });
        self.decisions.push(schedule(call_id, input));
        RemoteResult::Pending
    }
}

impl<G: IdGenerator> Scheduler for ReplayScheduler<G> {
    fn remote_activity(&mut self, call: ActivityCall) -> RemoteResult {
        let call_id = self.allocate_call_id();
        let config = match self.take_options() {
            Some(options) => call.config.with_overrides(&options),
            None => call.config,
        };
        self.replay(
            call_id,
            &call.args,
            call.args_serializer,
            call.result_deserializer,
            |call_id, input| Decision::ScheduleActivity {
                call_id,
                input,
                config,
            },
        )
    }

    fn remote_subworkflow(&mut self, call: SubworkflowCall) -> RemoteResult {
        let call_id = self.allocate_call_id();
        let config = match self.take_options() {
            Some(options) => call.config.with_overrides(&options),
            None => call.config,
        };
        self.replay(
            call_id,
            &call.args,
            call.args_serializer,
            call.result_deserializer,
            |call_id, input| Decision::StartSubworkflow {
                call_id,
                input,
                config,
            },
        )
    }

    fn suspend(&mut self) {
        self.decisions.push(Decision::Suspend);
    }

    fn fail(&mut self, reason: &str) {
        self.decisions.push(Decision::Fail {
            reason: reason.to_string(),
        });
    }

    fn finish(&mut self, result: String) {
        self.decisions.push(Decision::Complete { result });
    }

    fn restart(&mut self, arguments: String) {
        let next_run_id = self.ids.next_run_id();
        tracing::debug!(%next_run_id, "continue-as-new");
        self.decisions.push(Decision::Restart {
            input: arguments,
            next_run_id,
        });
    }

    fn options(&mut self, overrides: CallOptions) {
        self.pending_options = Some(match self.pending_options.take() {
            Some(previous) => previous.merge(overrides),
            None => overrides,
        });
    }

    fn resolution_position(&self) -> Option<u64> {
        self.last_position
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args;
    use crate::domain::{ActivityConfig, WorkflowConfig};
    use crate::typed::codec;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn activity_call(args: Args) -> ActivityCall {
        ActivityCall {
            args,
            args_serializer: codec::serialize_args,
            result_deserializer: codec::deserialize_result,
            config: ActivityConfig::new("Divider", "1").task_list("constant_list"),
        }
    }

    #[test]
    fn first_pass_schedules_and_returns_pending() {
        let mut scheduler = ReplayScheduler::new(Vec::new());

        let r = scheduler.remote_activity(activity_call(args![77, 2]));

        assert!(r.is_pending());
        assert_eq!(
            scheduler.decisions(),
            &[Decision::ScheduleActivity {
                call_id: CallId::FIRST,
                input: "[[77, 2], {}]".to_string(),
                config: ActivityConfig::new("Divider", "1").task_list("constant_list"),
            }]
        );
    }

    #[test]
    fn scheduled_but_unresolved_call_stays_pending_without_new_decision() {
        let history = vec![HistoryEvent::Scheduled {
            call_id: CallId::FIRST,
            input: "[[77, 2], {}]".to_string(),
        }];
        let mut scheduler = ReplayScheduler::new(history);

        assert!(scheduler.remote_activity(activity_call(args![77, 2])).is_pending());
        assert!(scheduler.decisions().is_empty());
    }

    #[test]
    fn resolved_call_returns_decoded_value() {
        let mut first = ReplayScheduler::new(Vec::new());
        first.remote_activity(activity_call(args![77, 2]));
        first.resolve(CallId::FIRST, RemoteResult::Value("false".to_string()));

        let mut second = ReplayScheduler::new(first.into_history());
        let r = second.remote_activity(activity_call(args![77, 2]));

        assert_eq!(r, RemoteResult::Value(json!(false)));
        assert!(second.decisions().is_empty());
    }

    #[test]
    fn failures_and_timeouts_replay_as_variants() {
        let history = vec![
            HistoryEvent::Failed {
                call_id: CallId::new(1),
                reason: "boom".to_string(),
            },
            HistoryEvent::TimedOut {
                call_id: CallId::new(2),
            },
        ];
        let mut scheduler = ReplayScheduler::new(history);

        assert_eq!(
            scheduler.remote_activity(activity_call(Args::new())),
            RemoteResult::Failed("boom".to_string())
        );
        assert_eq!(
            scheduler.remote_activity(activity_call(Args::new())),
            RemoteResult::TimedOut
        );
    }

    #[test]
    fn undecodable_result_becomes_failed() {
        let history = vec![HistoryEvent::Completed {
            call_id: CallId::FIRST,
            result: "not json".to_string(),
        }];
        let mut scheduler = ReplayScheduler::new(history);

        let r = scheduler.remote_activity(activity_call(Args::new()));
        assert!(matches!(r, RemoteResult::Failed(ref reason) if reason.starts_with("json decode")));
    }

    #[test]
    fn options_apply_to_the_next_call_only() {
        let mut scheduler = ReplayScheduler::new(Vec::new());
        scheduler.options(CallOptions::new().retry(7));
        scheduler.options(CallOptions::new().task_list("fast"));

        scheduler.remote_activity(activity_call(Args::new()));
        scheduler.remote_activity(activity_call(Args::new()));

        let configs: Vec<&ActivityConfig> = scheduler
            .decisions()
            .iter()
            .filter_map(|d| match d {
                Decision::ScheduleActivity { config, .. } => Some(config),
                _ => None,
            })
            .collect();
        assert_eq!(configs[0].retries(), 7);
        assert_eq!(configs[0].task_list_name(), Some("fast"));
        assert_eq!(configs[1].retries(), 3);
        assert_eq!(configs[1].task_list_name(), Some("constant_list"));
    }

    #[test]
    fn subworkflows_share_the_call_sequence() {
        let mut scheduler = ReplayScheduler::new(Vec::new());
        scheduler.remote_activity(activity_call(Args::new()));
        scheduler.remote_subworkflow(SubworkflowCall {
            args: args![; "depth" => 1],
            args_serializer: codec::serialize_args,
            result_deserializer: codec::deserialize_result,
            config: WorkflowConfig::new("Child", "2"),
        });

        let ids: Vec<Option<CallId>> = scheduler.decisions().iter().map(Decision::call_id).collect();
        assert_eq!(ids, vec![Some(CallId::new(1)), Some(CallId::new(2))]);
        assert!(matches!(
            scheduler.decisions()[1],
            Decision::StartSubworkflow { ref input, .. } if input == r#"[[], {"depth": 1}]"#
        ));
    }

    #[test]
    fn restart_records_a_fresh_run_id() {
        let mut scheduler = ReplayScheduler::new(Vec::new());
        scheduler.restart("[[1], {}]".to_string());

        assert!(scheduler.is_closed());
        match scheduler.terminal() {
            Some(Decision::Restart { input, next_run_id }) => {
                assert_eq!(input, "[[1], {}]");
                assert!(next_run_id.to_string().starts_with("run-"));
            }
            other => panic!("unexpected terminal decision: {other:?}"),
        }
    }

    #[test]
    fn resolution_position_follows_history_order() {
        let history = vec![
            HistoryEvent::Scheduled {
                call_id: CallId::new(1),
                input: "[[1], {}]".to_string(),
            },
            HistoryEvent::Scheduled {
                call_id: CallId::new(2),
                input: "[[2], {}]".to_string(),
            },
            HistoryEvent::Completed {
                call_id: CallId::new(2),
                result: "true".to_string(),
            },
            HistoryEvent::Failed {
                call_id: CallId::new(1),
                reason: "boom".to_string(),
            },
        ];
        let mut scheduler = ReplayScheduler::new(history);

        scheduler.remote_activity(activity_call(args![1]));
        assert_eq!(scheduler.resolution_position(), Some(3));
        scheduler.remote_activity(activity_call(args![2]));
        assert_eq!(scheduler.resolution_position(), Some(2));
        scheduler.remote_activity(activity_call(args![3]));
        assert_eq!(scheduler.resolution_position(), None);
    }

    #[test]
    fn suspend_is_terminal_but_not_closed() {
        let mut scheduler = ReplayScheduler::new(Vec::new());
        scheduler.suspend();
        assert_eq!(scheduler.terminal(), Some(&Decision::Suspend));
        assert!(!scheduler.is_closed());
    }

    #[test]
    fn same_history_gives_same_decisions() {
        let history = vec![HistoryEvent::Completed {
            call_id: CallId::FIRST,
            result: "true".to_string(),
        }];
        let run = |history: Vec<HistoryEvent>| {
            let mut scheduler = ReplayScheduler::new(history);
            scheduler.remote_activity(activity_call(args![1]));
            scheduler.remote_activity(activity_call(args![2]));
            scheduler.into_history()
        };

        assert_eq!(run(history.clone()), run(history));
    }
}
