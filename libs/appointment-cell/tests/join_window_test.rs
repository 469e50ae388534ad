// =====================================================================================
// JOIN WINDOW EVALUATION TESTS
// =====================================================================================

use std::sync::Mutex;

use assert_matches::assert_matches;
use chrono::{DateTime, Duration, Utc};
use mockall::{mock, predicate::eq};
use serde_json::json;

use appointment_cell::{
    JoinDecision, JoinTargetOpener, JoinWindowConfig, JoinWindowError, JoinWindowEvaluator,
    PendingPhase,
};
use shared_config::MAX_JOIN_WINDOW_MINUTES;
use shared_models::{AppointmentMode, JoinTarget};
use shared_utils::test_utils::{
    reference_now, TestAppointment, TestConfig, TEST_JOIN_URL, TEST_PASSCODE,
};

mock! {
    pub Opener {}

    impl JoinTargetOpener for Opener {
        fn open(&self, url: &str);
    }
}

fn evaluator() -> JoinWindowEvaluator {
    JoinWindowEvaluator::default()
}

#[test]
fn test_phone_appointments_are_always_informational() {
    let now = reference_now();
    let offsets = [
        Duration::days(-30),
        Duration::minutes(-61),
        Duration::zero(),
        Duration::minutes(15),
        Duration::days(365),
    ];

    for offset in offsets {
        let appointment = TestAppointment::phone(now + offset).build();
        assert_eq!(
            evaluator().evaluate(&appointment, now),
            JoinDecision::PhoneInformational,
            "phone appointment at offset {:?} should be informational",
            offset
        );
    }
}

#[test]
fn test_phone_appointment_with_stray_join_target_stays_informational() {
    let now = reference_now();
    let appointment = TestAppointment::phone(now)
        .with_join_target(JoinTarget::new(TEST_JOIN_URL))
        .build();

    let decision = evaluator().evaluate(&appointment, now);
    assert_eq!(decision, JoinDecision::PhoneInformational);
    assert!(!decision.is_actionable());
    assert_eq!(decision.label(), Some("Your doctor will call you"));
}

#[test]
fn test_video_without_join_target_is_not_applicable() {
    let now = reference_now();

    for offset in [Duration::minutes(-200), Duration::zero(), Duration::minutes(5)] {
        let appointment = TestAppointment::video_in(now, offset)
            .without_join_target()
            .build();
        assert_eq!(evaluator().evaluate(&appointment, now), JoinDecision::NotApplicable);
    }
}

#[test]
fn test_video_with_blank_url_is_not_applicable() {
    let now = reference_now();
    let appointment = TestAppointment::video(now)
        .with_join_target(JoinTarget::new("   "))
        .build();

    assert_eq!(evaluator().evaluate(&appointment, now), JoinDecision::NotApplicable);
    assert_eq!(evaluator().next_transition(&appointment, now), None);
}

#[test]
fn test_in_person_and_unknown_modes_render_nothing() {
    let now = reference_now();
    let in_person = TestAppointment::in_person(now).build();
    let mut other = TestAppointment::video(now).build();
    other.mode = AppointmentMode::Other;

    for appointment in [in_person, other] {
        let decision = evaluator().evaluate(&appointment, now);
        assert_eq!(decision, JoinDecision::NotApplicable);
        assert_eq!(decision.label(), None);
        assert_eq!(decision.hint(), None);
    }
}

#[test]
fn test_window_opens_exactly_fifteen_minutes_before_start() {
    let now = reference_now();

    let at_boundary = TestAppointment::video_in(now, Duration::minutes(15)).build();
    assert!(evaluator().evaluate(&at_boundary, now).is_actionable());

    let just_outside = TestAppointment::video_in(now, Duration::minutes(15) + Duration::seconds(1)).build();
    assert_matches!(
        evaluator().evaluate(&just_outside, now),
        JoinDecision::VideoPending {
            phase: PendingPhase::Upcoming,
            ..
        }
    );
}

#[test]
fn test_window_closes_sixty_minutes_after_start() {
    let now = reference_now();

    let at_boundary = TestAppointment::video_in(now, Duration::minutes(-60)).build();
    assert!(evaluator().evaluate(&at_boundary, now).is_actionable());

    let just_outside = TestAppointment::video_in(now, Duration::minutes(-60) - Duration::seconds(1)).build();
    let decision = evaluator().evaluate(&just_outside, now);
    assert!(!decision.is_actionable());
    assert_matches!(
        decision,
        JoinDecision::VideoPending {
            phase: PendingPhase::Elapsed,
            ..
        }
    );
}

#[test]
fn test_actionable_exposes_url_and_passcode() {
    let now = reference_now();
    let appointment = TestAppointment::video(now)
        .with_passcode(TEST_PASSCODE)
        .build();

    let decision = evaluator().evaluate(&appointment, now);
    let join = decision.actionable().expect("window should be open at start time");

    assert_eq!(join.url(), TEST_JOIN_URL);
    assert_eq!(join.passcode(), Some(TEST_PASSCODE));
    assert_eq!(join.window().opens_at, now - Duration::minutes(15));
    assert_eq!(join.window().closes_at, now + Duration::minutes(60));
    assert_eq!(decision.label(), Some("Join video call"));
}

#[test]
fn test_pending_still_shows_passcode_and_hint() {
    let now = reference_now();
    let appointment = TestAppointment::video_in(now, Duration::hours(2))
        .with_passcode(TEST_PASSCODE)
        .build();

    let decision = evaluator().evaluate(&appointment, now);

    assert!(!decision.is_actionable());
    assert_eq!(decision.passcode(), Some(TEST_PASSCODE));
    assert_eq!(
        decision.hint().as_deref(),
        Some("Available 15 minutes before your appointment")
    );
    assert_eq!(decision.label(), Some("Join video call"));
}

#[test]
fn test_custom_bounds_are_respected() {
    let now = reference_now();
    let config = JoinWindowConfig::new(5, 10).unwrap();
    let evaluator = JoinWindowEvaluator::new(config);

    let early = TestAppointment::video_in(now, Duration::minutes(6)).build();
    let open = TestAppointment::video_in(now, Duration::minutes(5)).build();
    let late = TestAppointment::video_in(now, Duration::minutes(-11)).build();

    assert!(!evaluator.evaluate(&early, now).is_actionable());
    assert!(evaluator.evaluate(&open, now).is_actionable());
    assert!(!evaluator.evaluate(&late, now).is_actionable());
    assert_eq!(
        evaluator.evaluate(&early, now).hint().as_deref(),
        Some("Available 5 minutes before your appointment")
    );
}

#[test]
fn test_evaluator_reads_app_config() {
    let app_config = TestConfig {
        early_join_minutes: 30,
        late_join_minutes: 0,
        ..TestConfig::default()
    }
    .to_app_config();
    let evaluator = JoinWindowEvaluator::from_app_config(&app_config);
    let now = reference_now();

    assert_eq!(evaluator.config().early_join_minutes, 30);
    assert!(evaluator
        .evaluate(&TestAppointment::video_in(now, Duration::minutes(30)).build(), now)
        .is_actionable());
    assert!(!evaluator
        .evaluate(&TestAppointment::video_in(now, Duration::seconds(-1)).build(), now)
        .is_actionable());
}

#[test]
fn test_negative_bounds_are_rejected() {
    assert_matches!(
        JoinWindowConfig::new(-1, 60),
        Err(JoinWindowError::InvalidConfig(_))
    );
    assert_matches!(
        JoinWindowConfig::new(15, -60),
        Err(JoinWindowError::InvalidConfig(_))
    );
}

#[test]
fn test_oversized_bounds_are_rejected() {
    assert_matches!(
        JoinWindowConfig::new(i64::MAX / 60_000, 60),
        Err(JoinWindowError::InvalidConfig(_))
    );
    assert_matches!(
        JoinWindowConfig::new(15, MAX_JOIN_WINDOW_MINUTES + 1),
        Err(JoinWindowError::InvalidConfig(_))
    );
    assert!(JoinWindowConfig::new(MAX_JOIN_WINDOW_MINUTES, MAX_JOIN_WINDOW_MINUTES).is_ok());
}

#[test]
fn test_app_config_bounds_are_clamped() {
    let app_config = TestConfig {
        early_join_minutes: i64::MAX,
        late_join_minutes: -5,
        ..TestConfig::default()
    }
    .to_app_config();

    let evaluator = JoinWindowEvaluator::from_app_config(&app_config);

    assert_eq!(evaluator.config().early_join_minutes, MAX_JOIN_WINDOW_MINUTES);
    assert_eq!(evaluator.config().late_join_minutes, 0);
}

#[test]
fn test_unvalidated_huge_bounds_saturate_instead_of_panicking() {
    let config = JoinWindowConfig {
        early_join_minutes: i64::MAX,
        late_join_minutes: i64::MAX,
    };
    let evaluator = JoinWindowEvaluator::new(config);
    let now = reference_now();
    let appointment = TestAppointment::video(now).build();

    let decision = evaluator.evaluate(&appointment, now);
    let join = decision.actionable().expect("window spans all of time");

    assert_eq!(join.window().opens_at, DateTime::<Utc>::MIN_UTC);
    assert_eq!(join.window().closes_at, DateTime::<Utc>::MAX_UTC);
    assert_eq!(evaluator.next_transition(&appointment, now), None);
}

#[test]
fn test_start_at_latest_instant_is_pending_then_never_closes() {
    let now = reference_now();
    let appointment = TestAppointment::video(DateTime::<Utc>::MAX_UTC).build();
    let evaluator = evaluator();

    assert_matches!(
        evaluator.evaluate(&appointment, now),
        JoinDecision::VideoPending { phase: PendingPhase::Upcoming, window, .. }
            if window.closes_at == DateTime::<Utc>::MAX_UTC
    );

    let opens_at = evaluator.next_transition(&appointment, now).unwrap();
    assert_eq!(opens_at, DateTime::<Utc>::MAX_UTC - Duration::minutes(15));
    assert!(evaluator.evaluate(&appointment, opens_at).is_actionable());
    assert!(evaluator
        .evaluate(&appointment, DateTime::<Utc>::MAX_UTC)
        .is_actionable());
    assert_eq!(evaluator.next_transition(&appointment, opens_at), None);
}

#[test]
fn test_start_at_earliest_instant_has_elapsed() {
    let now = reference_now();
    let appointment = TestAppointment::video(DateTime::<Utc>::MIN_UTC).build();

    assert_matches!(
        evaluator().evaluate(&appointment, now),
        JoinDecision::VideoPending { phase: PendingPhase::Elapsed, window, .. }
            if window.opens_at == DateTime::<Utc>::MIN_UTC
    );
    assert_eq!(evaluator().next_transition(&appointment, now), None);
    assert!(evaluator()
        .evaluate(&appointment, DateTime::<Utc>::MIN_UTC)
        .is_actionable());
}

#[test]
fn test_next_transition_tracks_window_edges() {
    let now = reference_now();
    let appointment = TestAppointment::video_in(now, Duration::hours(1)).build();
    let evaluator = evaluator();

    let opens_at = evaluator.next_transition(&appointment, now).unwrap();
    assert_eq!(opens_at, now + Duration::minutes(45));
    assert!(evaluator.evaluate(&appointment, opens_at).is_actionable());

    let closes_after = evaluator.next_transition(&appointment, opens_at).unwrap();
    assert!(!evaluator.evaluate(&appointment, closes_after).is_actionable());
    assert!(evaluator
        .evaluate(&appointment, closes_after - Duration::nanoseconds(1))
        .is_actionable());

    assert_eq!(evaluator.next_transition(&appointment, closes_after), None);
    assert_eq!(
        evaluator.next_transition(&TestAppointment::phone(now).build(), now),
        None
    );
}

#[test]
fn test_evaluate_all_preserves_order() {
    let now = reference_now();
    let appointments = vec![
        TestAppointment::phone(now).build(),
        TestAppointment::video(now).build(),
        TestAppointment::in_person(now).build(),
        TestAppointment::video_in(now, Duration::days(1)).build(),
    ];

    let kinds: Vec<&str> = evaluator()
        .evaluate_all(&appointments, now)
        .iter()
        .map(JoinDecision::kind)
        .collect();

    assert_eq!(
        kinds,
        vec!["phone_informational", "video_actionable", "not_applicable", "video_pending"]
    );
}

#[test]
fn test_open_hands_url_to_opener_once() {
    let now = reference_now();
    let appointment = TestAppointment::video(now).build();
    let decision = evaluator().evaluate(&appointment, now);

    let mut opener = MockOpener::new();
    opener
        .expect_open()
        .with(eq(TEST_JOIN_URL))
        .times(1)
        .return_const(());

    decision.actionable().unwrap().open(&opener);
}

#[test]
fn test_closure_can_act_as_opener() {
    let now = reference_now();
    let appointment = TestAppointment::video(now).build();
    let opened = Mutex::new(Vec::new());

    let opener = |url: &str| opened.lock().unwrap().push(url.to_string());
    if let JoinDecision::VideoActionable(join) = evaluator().evaluate(&appointment, now) {
        join.open(&opener);
    }

    assert_eq!(*opened.lock().unwrap(), vec![TEST_JOIN_URL.to_string()]);
}

#[test]
fn test_decision_serializes_for_the_ui_layer() {
    let now = reference_now();
    let appointment = TestAppointment::video(now)
        .with_passcode(TEST_PASSCODE)
        .build();

    let value = serde_json::to_value(evaluator().evaluate(&appointment, now)).unwrap();

    assert_eq!(value["state"], json!("video_actionable"));
    assert_eq!(value["url"], json!(TEST_JOIN_URL));
    assert_eq!(value["passcode"], json!(TEST_PASSCODE));

    let phone = serde_json::to_value(JoinDecision::PhoneInformational).unwrap();
    assert_eq!(phone, json!({ "state": "phone_informational" }));
}
