mod common;

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use tokio::time::Instant;
use url::Url;

use readlib_client::config::ClientConfig;
use readlib_client::error::{JobError, RemoteError};
use readlib_client::job::cancel::Cancellation;
use readlib_client::job::client::AsyncJobClient;
use readlib_client::job::state::JobId;
use readlib_client::rpc::envelope::RpcContext;

use common::{config, finished, pending, submitted, ScriptedTransport};

const MODULE: &str = "kb_read_library_to_file";
const OPERATION: &str = "convert_read_library_to_file";
const INTERVAL: Duration = Duration::from_millis(5000);

fn client(transport: &Arc<ScriptedTransport>) -> AsyncJobClient {
    AsyncJobClient::new(transport.clone(), MODULE, &config(INTERVAL))
}

fn request() -> Value {
    json!({"workspace_name": "my_ws", "read_libraries": ["frbasic"]})
}

#[tokio::test(start_paused = true)]
async fn submit_then_poll_sequencing() {
    let transport = Arc::new(ScriptedTransport::new(vec![
        submitted("job-1"),
        pending(),
        pending(),
        finished(json!({"files": {}})),
    ]));

    let output: Value = client(&transport)
        .submit_and_wait(OPERATION, &request(), &mut Cancellation::never())
        .await
        .unwrap();
    assert_eq!(output, json!({"files": {}}));

    let calls = transport.calls();
    assert_eq!(calls.len(), 4);
    assert_eq!(calls[0].method, "kb_read_library_to_file._convert_read_library_to_file_submit");
    assert_eq!(calls[0].params, vec![request()]);
    for call in &calls[1..] {
        assert_eq!(call.method, "kb_read_library_to_file._check_job");
        assert_eq!(call.params, vec![json!("job-1")]);
        assert_eq!(call.context, None);
    }
}

#[tokio::test(start_paused = true)]
async fn fixed_interval_pacing() {
    let k = 3;
    let mut script = vec![submitted("job-2")];
    script.extend((0..k).map(|_| pending()));
    script.push(finished(json!("done")));
    let transport = Arc::new(ScriptedTransport::new(script));

    let _: Value = client(&transport)
        .submit_and_wait(OPERATION, &request(), &mut Cancellation::never())
        .await
        .unwrap();

    let checks = transport.calls_to("._check_job");
    assert_eq!(checks.len(), k + 1);
    for pair in checks.windows(2) {
        assert_eq!(pair[1].at - pair[0].at, INTERVAL);
    }
}

#[tokio::test(start_paused = true)]
async fn immediate_return_on_first_completion() {
    let transport = Arc::new(ScriptedTransport::new(vec![finished(json!({"files": {"a": {}}}))]));
    let start = Instant::now();

    let output: Value = client(&transport)
        .poll_until_complete(&JobId::new("job-3"), &mut Cancellation::never())
        .await
        .unwrap();

    assert_eq!(output, json!({"files": {"a": {}}}));
    assert_eq!(transport.calls().len(), 1);
    assert_eq!(Instant::now(), start);
}

#[tokio::test(start_paused = true)]
async fn result_extraction_takes_first_element() {
    let transport = Arc::new(ScriptedTransport::new(vec![Ok(vec![json!({
        "finished": true,
        "result": [{"files": {"x": {"fwd": "/tmp/x.fq"}}}, {"ignored": true}]
    })])]));

    let output: Value = client(&transport)
        .poll_until_complete(&JobId::new("job-4"), &mut Cancellation::never())
        .await
        .unwrap();
    assert_eq!(output, json!({"files": {"x": {"fwd": "/tmp/x.fq"}}}));
}

#[tokio::test(start_paused = true)]
async fn cancellation_after_a_check_stops_polling() {
    let (handle, mut cancel) = Cancellation::pair();
    // cancel while the second status check is in flight
    let transport = Arc::new(
        ScriptedTransport::new(vec![pending(), pending(), pending(), finished(json!(1))]).cancel_on_call(2, handle),
    );
    let start = Instant::now();

    let err = client(&transport)
        .poll_until_complete::<Value>(&JobId::new("job-5"), &mut cancel)
        .await
        .unwrap_err();

    assert!(matches!(err, JobError::Cancelled(ref id) if id == "job-5"));
    assert_eq!(transport.calls().len(), 2);
    assert_eq!(Instant::now() - start, INTERVAL);
}

#[tokio::test(start_paused = true)]
async fn cancellation_interrupts_the_sleep() {
    let (handle, mut cancel) = Cancellation::pair();
    let transport = Arc::new(ScriptedTransport::new(vec![pending(), pending()]));
    let start = Instant::now();

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(1200)).await;
        handle.cancel();
    });

    let err = client(&transport)
        .poll_until_complete::<Value>(&JobId::new("job-6"), &mut cancel)
        .await
        .unwrap_err();

    assert!(matches!(err, JobError::Cancelled(_)));
    assert_eq!(transport.calls().len(), 1);
    assert_eq!(Instant::now() - start, Duration::from_millis(1200));
}

#[tokio::test(start_paused = true)]
async fn cancelled_before_start_issues_no_call() {
    let (handle, mut cancel) = Cancellation::pair();
    handle.cancel();
    let transport = Arc::new(ScriptedTransport::new(vec![finished(json!(1))]));

    let err = client(&transport)
        .poll_until_complete::<Value>(&JobId::new("job-7"), &mut cancel)
        .await
        .unwrap_err();

    assert!(matches!(err, JobError::Cancelled(_)));
    assert!(transport.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn transport_failure_propagates_without_retry() {
    let transport = Arc::new(ScriptedTransport::new(vec![
        pending(),
        Err(JobError::Transport("connection reset".to_string())),
        pending(),
        finished(json!(1)),
    ]));

    let err = client(&transport)
        .poll_until_complete::<Value>(&JobId::new("job-8"), &mut Cancellation::never())
        .await
        .unwrap_err();

    assert!(matches!(err, JobError::Transport(ref msg) if msg == "connection reset"));
    assert_eq!(transport.calls().len(), 2);
    assert_eq!(transport.remaining(), 2);
}

#[tokio::test(start_paused = true)]
async fn empty_submit_result_is_protocol_error() {
    let transport = Arc::new(ScriptedTransport::new(vec![Ok(vec![]), finished(json!(1))]));

    let err = client(&transport)
        .submit_and_wait::<_, Value>(OPERATION, &request(), &mut Cancellation::never())
        .await
        .unwrap_err();

    assert!(matches!(err, JobError::Protocol(_)));
    assert_eq!(transport.calls().len(), 1);
}

#[tokio::test]
async fn non_string_job_id_is_protocol_error() {
    let transport = Arc::new(ScriptedTransport::new(vec![Ok(vec![json!(42)])]));
    let err = client(&transport).submit(OPERATION, &request()).await.unwrap_err();
    assert!(matches!(err, JobError::Protocol(_)));
}

#[tokio::test]
async fn submit_sends_service_version() {
    let transport = Arc::new(ScriptedTransport::new(vec![submitted("job-9")]));
    let id = client(&transport).submit(OPERATION, &request()).await.unwrap();

    assert_eq!(id, JobId::new("job-9"));
    assert_eq!(transport.calls()[0].context, Some(RpcContext::with_service_ver("release")));
}

#[tokio::test]
async fn submit_without_version_tag() {
    let transport = Arc::new(ScriptedTransport::new(vec![submitted("job-10")]));
    let config = ClientConfig::builder(Url::parse("https://kbase.us/services/njs_wrapper").unwrap())
        .async_version(None)
        .build()
        .unwrap();

    AsyncJobClient::new(transport.clone(), MODULE, &config)
        .submit(OPERATION, &request())
        .await
        .unwrap();
    assert_eq!(transport.calls()[0].context, None);
}

#[tokio::test]
async fn caller_context_is_kept_and_tagged() {
    let transport = Arc::new(ScriptedTransport::new(vec![submitted("job-11")]));
    let mut context = RpcContext::default();
    context.additional_properties.insert("run_id".to_string(), json!("r-1"));

    client(&transport)
        .submit_with_context(OPERATION, &request(), Some(context))
        .await
        .unwrap();

    let sent = transport.calls()[0].context.clone().unwrap();
    assert_eq!(sent.service_ver.as_deref(), Some("release"));
    assert_eq!(sent.additional_properties.get("run_id"), Some(&json!("r-1")));
}

#[tokio::test(start_paused = true)]
async fn remote_job_failure_is_passed_through() {
    let error = json!({"name": "Server error", "code": -32000, "message": "Invalid workspace name", "error": "trace"});
    let transport = Arc::new(ScriptedTransport::new(vec![
        pending(),
        Ok(vec![json!({"finished": 1, "error": error.clone()})]),
    ]));

    let err = client(&transport)
        .poll_until_complete::<Value>(&JobId::new("job-12"), &mut Cancellation::never())
        .await
        .unwrap_err();

    match err {
        JobError::RemoteJob(remote) => assert_eq!(remote, RemoteError::from_value(error)),
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(transport.calls().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn failed_job_wins_over_unreadable_result() {
    #[derive(Debug, serde::Deserialize)]
    struct Typed {
        #[allow(dead_code)]
        files: Value,
    }

    let error = json!({"message": "boom"});
    let transport = Arc::new(ScriptedTransport::new(vec![Ok(vec![
        json!({"finished": 1, "error": error.clone(), "result": [null]}),
    ])]));

    let err = client(&transport)
        .poll_until_complete::<Typed>(&JobId::new("job-15"), &mut Cancellation::never())
        .await
        .unwrap_err();

    match err {
        JobError::RemoteJob(remote) => assert_eq!(remote, RemoteError::from_value(error)),
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test]
async fn empty_check_result_is_protocol_error() {
    let transport = Arc::new(ScriptedTransport::new(vec![Ok(vec![])]));
    let err = client(&transport).check_job(&JobId::new("job-13")).await.unwrap_err();
    assert!(matches!(err, JobError::Protocol(_)));
}

#[tokio::test]
async fn malformed_job_state_is_protocol_error() {
    let transport = Arc::new(ScriptedTransport::new(vec![Ok(vec![json!("not a state")])]));
    let err = client(&transport).check_job(&JobId::new("job-14")).await.unwrap_err();
    assert!(matches!(err, JobError::Protocol(_)));
}

#[tokio::test(start_paused = true)]
async fn independent_jobs_poll_concurrently() {
    let slow = Arc::new(ScriptedTransport::new(vec![pending(), pending(), finished(json!("slow"))]));
    let fast = Arc::new(ScriptedTransport::new(vec![pending(), finished(json!("fast"))]));
    let slow_client = client(&slow);
    let fast_client = client(&fast);
    let (slow_id, fast_id) = (JobId::new("slow"), JobId::new("fast"));
    let (mut slow_cancel, mut fast_cancel) = (Cancellation::never(), Cancellation::never());
    let start = Instant::now();

    let (a, b) = tokio::join!(
        slow_client.poll_until_complete::<Value>(&slow_id, &mut slow_cancel),
        fast_client.poll_until_complete::<Value>(&fast_id, &mut fast_cancel),
    );

    assert_eq!(a.unwrap(), json!("slow"));
    assert_eq!(b.unwrap(), json!("fast"));
    assert_eq!(Instant::now() - start, INTERVAL * 2);
}
