pub mod fixtures;

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use herald_emitter::*;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_wait_times_out_without_emission() {
        let (emitter, _) = setup_emitter();
        let wait = emitter.wait_for_event("ready", Duration::from_millis(50)).unwrap();
        assert!(emitter.has_listeners(&"ready"));

        assert!(!wait.await);
        assert!(!emitter.has_listeners(&"ready"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_resolves_on_emission_before_timeout() {
        let (emitter, _) = setup_emitter();
        let recorder = Recorder::new();
        emitter.on_no_event_listeners(recorder.hook("none")).unwrap();

        let wait = emitter.wait_for_event("ready", Duration::from_millis(50)).unwrap();
        let producer = emitter.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            producer.emit(&"ready", 1)
        });

        assert!(wait.await);
        assert_eq!(handle.await.unwrap(), 1);

        // Letting the original deadline pass must not touch the registry again.
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(recorder.calls(), ["none:ready"]);
        assert_eq!(emitter.event_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_emission_right_after_call_is_observed() {
        let (emitter, _) = setup_emitter();
        let wait = emitter.wait_for_event("ready", Duration::ZERO).unwrap();
        emitter.emit(&"ready", 1);
        assert!(wait.await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_timeout_waits_indefinitely() {
        let (emitter, _) = setup_emitter();
        let wait = emitter.wait_for_event("ready", Duration::ZERO).unwrap();

        let producer = emitter.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            producer.emit(&"ready", 1);
        });

        assert!(wait.await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_wait_leaves_no_listener() {
        let (emitter, _) = setup_emitter();
        let wait = emitter.wait_for_event("ready", Duration::from_secs(1)).unwrap();
        let any = emitter.wait_for_any_event(["a", "b"], Duration::ZERO).unwrap();
        assert_eq!(emitter.event_count(), 3);

        drop(wait);
        drop(any);
        assert_eq!(emitter.event_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cleared_wait_resolves_false() {
        let (emitter, _) = setup_emitter();
        let wait = emitter.wait_for_event("ready", Duration::ZERO).unwrap();

        emitter.clear_event_listeners(&"ready");
        assert!(!wait.await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_destroy_resolves_pending_waits() {
        let (emitter, _) = setup_emitter();
        let single = emitter.wait_for_event("ready", Duration::ZERO).unwrap();
        let any = emitter.wait_for_any_event(["a", "b"], Duration::ZERO).unwrap();

        emitter.destroy();
        assert!(!single.await);
        assert!(!any.await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_after_destroy_fails() {
        let (emitter, _) = setup_emitter();
        emitter.destroy();

        let err = emitter.wait_for_event("ready", Duration::ZERO).unwrap_err();
        assert!(err.to_string().contains("(wait_for_event)"));
        let err = emitter.wait_for_any_event(["a"], Duration::ZERO).unwrap_err();
        assert!(err.to_string().contains("(wait_for_any_event)"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_any_event_first_wins_and_cleans_up() {
        let (emitter, _) = setup_emitter();
        let recorder = Recorder::new();
        emitter.on_has_event_listeners(recorder.hook("has")).unwrap();

        let wait =
            emitter.wait_for_any_event(["a", "b", "a", "c"], Duration::from_secs(1)).unwrap();
        assert_eq!(recorder.calls(), ["has:a", "has:b", "has:c"]);
        assert_eq!(emitter.listener_count(&"a"), 1);

        assert_eq!(emitter.emit(&"b", 1), 1);
        assert_eq!(emitter.event_count(), 0);
        assert!(wait.await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_any_event_times_out() {
        let (emitter, _) = setup_emitter();
        let wait = emitter.wait_for_any_event(["a", "b"], Duration::from_millis(20)).unwrap();

        assert!(!wait.await);
        assert_eq!(emitter.event_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_any_event_with_empty_set_resolves_false() {
        let (emitter, _) = setup_emitter();
        let wait = emitter.wait_for_any_event(Vec::new(), Duration::ZERO).unwrap();
        assert!(!wait.await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_other_listeners_survive_a_resolved_wait() {
        let (emitter, _) = setup_emitter();
        let recorder = Recorder::new();
        emitter.on("ready", recorder.listener("keep")).unwrap();

        let wait = emitter.wait_for_event("ready", Duration::from_millis(5)).unwrap();
        emitter.emit(&"ready", 1);
        assert!(wait.await);

        emitter.emit(&"ready", 2);
        assert_eq!(recorder.calls(), ["keep:1", "keep:2"]);
        assert_eq!(emitter.listener_count(&"ready"), 1);
    }
}
