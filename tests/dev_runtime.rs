use std::error::Error;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use assetpipe::engine::{
    CoreCommand, DevCore, Runtime, RuntimeEvent, RuntimeOptions, TaskOutcome, TriggerReason,
};
use assetpipe::server::{ReloadKind, ReloadNotifier};
use assetpipe::tasks::TaskName;
use assetpipe_test_utils::fake_executor::FakeExecutor;
use assetpipe_test_utils::{init_tracing, with_timeout};
use tokio::sync::broadcast::error::TryRecvError;
use tokio::sync::mpsc;

type TestResult = Result<(), Box<dyn Error>>;

fn triggered(task: TaskName) -> RuntimeEvent {
    RuntimeEvent::TaskTriggered {
        task,
        reason: TriggerReason::FileWatch,
    }
}

fn completed(task: TaskName, outcome: TaskOutcome) -> RuntimeEvent {
    RuntimeEvent::TaskCompleted { task, outcome }
}

#[test]
fn core_dispatches_triggered_tasks() {
    let mut core = DevCore::new(RuntimeOptions::default());

    let step = core.step(triggered(TaskName::Scripts));

    assert_eq!(step.commands, vec![CoreCommand::Dispatch(vec![TaskName::Scripts])]);
    assert!(step.keep_running);
    assert_eq!(core.in_flight(TaskName::Scripts), 1);
}

#[test]
fn core_notifies_by_task_kind() {
    let mut core = DevCore::new(RuntimeOptions::default());

    for task in [TaskName::Styles, TaskName::HtmlInclude, TaskName::Images] {
        core.step(triggered(task));
    }

    let styles = core.step(completed(TaskName::Styles, TaskOutcome::Success));
    assert_eq!(styles.commands, vec![CoreCommand::Notify(ReloadKind::InjectCss)]);

    let html = core.step(completed(TaskName::HtmlInclude, TaskOutcome::Success));
    assert_eq!(html.commands, vec![CoreCommand::Notify(ReloadKind::Reload)]);

    let images = core.step(completed(TaskName::Images, TaskOutcome::Success));
    assert!(images.commands.is_empty());
    assert!(core.is_idle());
}

#[test]
fn failed_tasks_do_not_notify_or_stop_the_session() {
    let mut core = DevCore::new(RuntimeOptions::default());
    core.step(triggered(TaskName::Styles));

    let step = core.step(completed(TaskName::Styles, TaskOutcome::Failed("bad scss".into())));

    assert!(step.commands.is_empty());
    assert!(step.keep_running);
}

#[test]
fn overlapping_runs_are_counted() {
    let mut core = DevCore::new(RuntimeOptions {
        exit_when_idle: true,
    });
    core.step(triggered(TaskName::Styles));
    core.step(triggered(TaskName::Styles));
    assert_eq!(core.in_flight(TaskName::Styles), 2);

    let first = core.step(completed(TaskName::Styles, TaskOutcome::Success));
    assert!(first.keep_running);

    let second = core.step(completed(TaskName::Styles, TaskOutcome::Success));
    assert!(!second.keep_running);
}

#[test]
fn service_failure_aborts() {
    let mut core = DevCore::new(RuntimeOptions::default());

    let step = core.step(RuntimeEvent::ServiceFailed {
        service: "browsersync",
        message: "address in use".into(),
    });

    assert!(!step.keep_running);
    assert_eq!(
        step.commands,
        vec![CoreCommand::Abort("browsersync: address in use".into())]
    );
}

#[tokio::test]
async fn style_change_runs_styles_once_and_injects_css_once() -> TestResult {
    init_tracing();
    let (tx, rx) = mpsc::channel(64);
    let executed = Arc::new(Mutex::new(Vec::new()));
    let notifier = ReloadNotifier::default();
    let mut browser = notifier.subscribe();

    let runtime = Runtime::new(
        DevCore::new(RuntimeOptions::default()),
        rx,
        FakeExecutor::new(tx.clone(), Arc::clone(&executed)),
        Some(notifier),
    );
    let handle = tokio::spawn(runtime.run());

    tx.send(triggered(TaskName::Styles)).await?;
    let kind = with_timeout(browser.recv()).await?;
    assert_eq!(kind, ReloadKind::InjectCss);

    tokio::time::sleep(Duration::from_millis(50)).await;
    tx.send(RuntimeEvent::ShutdownRequested).await?;
    with_timeout(handle).await??;

    assert_eq!(*executed.lock().unwrap(), vec![TaskName::Styles]);
    assert!(matches!(browser.try_recv(), Err(TryRecvError::Empty | TryRecvError::Closed)));
    Ok(())
}

#[tokio::test]
async fn runtime_exits_when_idle_if_asked() -> TestResult {
    init_tracing();
    let (tx, rx) = mpsc::channel(64);
    let executed = Arc::new(Mutex::new(Vec::new()));

    let runtime = Runtime::new(
        DevCore::new(RuntimeOptions {
            exit_when_idle: true,
        }),
        rx,
        FakeExecutor::new(tx.clone(), Arc::clone(&executed)),
        None,
    );

    tx.send(triggered(TaskName::Scripts)).await?;
    with_timeout(runtime.run()).await?;

    assert_eq!(*executed.lock().unwrap(), vec![TaskName::Scripts]);
    Ok(())
}

#[tokio::test]
async fn runtime_fails_when_a_service_dies() {
    init_tracing();
    let (tx, rx) = mpsc::channel(64);
    let executed = Arc::new(Mutex::new(Vec::new()));
    let runtime = Runtime::new(
        DevCore::new(RuntimeOptions::default()),
        rx,
        FakeExecutor::new(tx.clone(), executed),
        None,
    );

    tx.send(RuntimeEvent::ServiceFailed {
        service: "browsersync",
        message: "bind failed".into(),
    })
    .await
    .unwrap();

    let err = with_timeout(runtime.run()).await.unwrap_err();
    assert!(err.to_string().contains("bind failed"));
}
