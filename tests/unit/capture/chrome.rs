use super::*;

#[test]
fn expired_wait_is_a_render_timeout() {
    let err = anyhow::Error::new(Timeout).context("waiting for element");
    let mapped = readiness_error("#done", Duration::from_millis(250), err);
    match mapped {
        AnimcapError::RenderTimeout(msg) => {
            assert!(msg.contains("'#done' not visible after 250ms"), "{msg}");
        }
        other => panic!("expected render timeout, got {other:?}"),
    }
}

#[test]
fn transport_failure_is_not_a_render_timeout() {
    let err = anyhow::Error::new(std::io::Error::new(
        std::io::ErrorKind::ConnectionReset,
        "connection closed",
    ));
    let mapped = readiness_error("#done", Duration::from_secs(30), err);
    assert!(matches!(mapped, AnimcapError::Other(_)), "{mapped:?}");
    assert!(mapped.to_string().contains("wait for '#done'"));
}
