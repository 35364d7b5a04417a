use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tracing_subscriber::EnvFilter;
use weft_core::args;
use weft_core::domain::{CallId, Decision};
use weft_core::impls::{LocalTransport, ReplayScheduler};
use weft_core::{
    Activity, ActivityConfig, ActivityContext, ActivityProxy, ActivityTask, Args, BindingError,
    Completion, Interrupt, Invocation, ProxySet, Task, Workflow, WorkflowContext, WorkflowTask,
};

const MAX_PASSES: usize = 256;

/// n を 2..=n/2 で順に割ってみる。1 つ割るごとに 1 回 replay される
struct PrimeTest;

impl Workflow for PrimeTest {
    type Output = String;

    fn proxies(&self) -> Result<ProxySet, BindingError> {
        ProxySet::new().declare(
            "div",
            ActivityProxy::new(ActivityConfig::new("Divider", "1").task_list("prime_task_list")),
        )
    }

    fn run(
        &self,
        ctx: &mut WorkflowContext<'_>,
        args: Args,
    ) -> Result<Completion<String>, Interrupt> {
        let n: u64 = args.opt_arg(0)?.unwrap_or(7 * 11);
        for i in 2..=n / 2 {
            if ctx.call("div", args![n, i])?.decode::<bool>().result()? {
                tracing::info!(n, i, "found a divisor");
                return Ok(Completion::plain("not prime".to_string()));
            }
        }
        Ok(Completion::plain("prime".to_string()))
    }
}

struct Divider;

#[async_trait]
impl Activity for Divider {
    type Output = bool;

    async fn run(&self, ctx: &ActivityContext<'_>, args: Args) -> Result<bool, Interrupt> {
        ctx.heartbeat().await;
        let (n, i): (u64, u64) = args.decode()?;
        Ok(n % i == 0)
    }
}

#[derive(Debug, Serialize)]
struct Summary {
    n: u64,
    passes: usize,
    activities: usize,
    verdict: Option<String>,
    decision: Option<Decision>,
}

/// activity worker：スケジュールされた call を実行して history に書き戻す
async fn activity_loop(
    scheduler: &mut ReplayScheduler,
    transport: &Arc<LocalTransport>,
) -> Result<usize, BindingError> {
    let calls: Vec<(CallId, String)> = scheduler
        .scheduled_calls()
        .filter_map(|d| match d {
            Decision::ScheduleActivity { call_id, input, .. } => Some((*call_id, input.clone())),
            _ => None,
        })
        .collect();

    for (call_id, input) in &calls {
        let token = format!("divider-{call_id}");
        let mut task = ActivityTask::new(
            Divider,
            Invocation::new(input.clone(), token.clone()),
            transport.clone(),
        );
        let reported = task.invoke().await?;
        println!("  {call_id}: input={input} reported={reported}");
        scheduler.resolve(*call_id, transport.outcome(&token).await);
    }
    Ok(calls.len())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("weft_core=info")),
        )
        .init();

    // (A) 入力（省略時は 77）
    let n: u64 = match std::env::args().nth(1) {
        Some(arg) => arg.parse()?,
        None => 7 * 11,
    };
    let invocation = Invocation::from_args(&args![n], "prime-workflow")?;
    let transport = Arc::new(LocalTransport::default());

    // (B) decision pass を閉じるまで繰り返す
    let mut history = Vec::new();
    let mut passes = 0;
    let mut activities = 0;
    let decision = loop {
        passes += 1;
        let mut task = WorkflowTask::new(PrimeTest, invocation.clone(), ReplayScheduler::new(history))?;
        task.invoke().await?;
        let mut scheduler = task.into_scheduler();

        println!("pass {passes}:");
        for d in scheduler.decisions() {
            println!("  {}", serde_json::to_string(d)?);
        }

        if scheduler.is_closed() || passes >= MAX_PASSES {
            break scheduler.terminal().cloned();
        }

        // (C) activity を実行して結果を history に残す
        activities += activity_loop(&mut scheduler, &transport).await?;
        history = scheduler.into_history();
    };

    // (D) 結果
    let verdict = match &decision {
        Some(Decision::Complete { result }) => Some(serde_json::from_str::<String>(result)?),
        _ => None,
    };
    let summary = Summary {
        n,
        passes,
        activities,
        verdict,
        decision,
    };
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
