//! End-to-end workflow tests over the service layer: request
//! lifecycles, review authorization, race semantics, audit counts and
//! notification side effects.

mod common;

use chrono::NaiveDate;
use ta_desk_backend::models::{AssignmentKind, LeaveType, RequestStatus, ReviewDecision, Role, User};
use ta_desk_backend::services::audit_service::ClientInfo;
use ta_desk_backend::services::leave_service::CreateLeaveRequest;
use ta_desk_backend::services::swap_service::CreateSwapRequest;
use ta_desk_backend::store::{AuditFilter, AuditLogStore, NotificationStore, UserStore};
use ta_desk_backend::AppError;
use uuid::Uuid;

use common::{identity_for, seed_assignment, seed_user, test_state};

fn leave_input() -> CreateLeaveRequest {
    CreateLeaveRequest {
        leave_type: LeaveType::Sick,
        start_date: NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
        end_date: NaiveDate::from_ymd_opt(2025, 3, 12).unwrap(),
        reason: "flu".into(),
    }
}

fn client() -> ClientInfo {
    ClientInfo::default()
}

async fn audit_count(store: &ta_desk_backend::store::MemoryStore, action: &str) -> usize {
    let filter = AuditFilter {
        action: Some(action.to_string()),
        ..Default::default()
    };
    store.query_audit(&filter, 0, usize::MAX).await.unwrap().1
}

#[tokio::test]
async fn leave_request_starts_pending() {
    let (state, store) = test_state();
    let ta = seed_user(&store, "ta1", Role::TeachingAssistant).await;

    let request = state
        .leave
        .create(&identity_for(&ta), &client(), leave_input())
        .await
        .unwrap();

    assert_eq!(request.status, RequestStatus::Pending);
    assert_eq!(request.requester_id, ta.id);
    assert!(request.reviewer_id.is_none());
    assert!(request.reviewed_at.is_none());
    assert_eq!(audit_count(&store, "create_leave_request").await, 1);
}

#[tokio::test]
async fn leave_create_validates_input() {
    let (state, store) = test_state();
    let ta = seed_user(&store, "ta1", Role::TeachingAssistant).await;
    let identity = identity_for(&ta);

    let mut input = leave_input();
    input.reason = "   ".into();
    let err = state.leave.create(&identity, &client(), input).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let mut input = leave_input();
    input.end_date = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
    let err = state.leave.create(&identity, &client(), input).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    // no audit entries for rejected creations
    assert_eq!(audit_count(&store, "create_leave_request").await, 0);
}

#[tokio::test]
async fn approve_sets_reviewer_fields_and_notifies() {
    let (state, store) = test_state();
    let ta = seed_user(&store, "ta1", Role::TeachingAssistant).await;
    let chair = seed_user(&store, "chair", Role::DepartmentChair).await;

    let request = state
        .leave
        .create(&identity_for(&ta), &client(), leave_input())
        .await
        .unwrap();

    let decided = state
        .leave
        .decide(
            &identity_for(&chair),
            &client(),
            request.id,
            ReviewDecision::Approved,
            Some("ok".into()),
        )
        .await
        .unwrap();

    assert_eq!(decided.status, RequestStatus::Approved);
    assert_eq!(decided.reviewer_id, Some(chair.id));
    assert_eq!(decided.reviewer_notes.as_deref(), Some("ok"));
    assert!(decided.reviewed_at.is_some());

    let inbox = store.notifications_for(ta.id).await.unwrap();
    assert_eq!(inbox.len(), 1);
    assert_eq!(inbox[0].kind, "leave_status");
    assert!(inbox[0].message.contains("approved"));

    assert_eq!(audit_count(&store, "update_status_leave_request").await, 1);
}

#[tokio::test]
async fn teaching_assistant_cannot_decide() {
    let (state, store) = test_state();
    let ta = seed_user(&store, "ta1", Role::TeachingAssistant).await;
    let peer = seed_user(&store, "ta2", Role::TeachingAssistant).await;

    let request = state
        .leave
        .create(&identity_for(&ta), &client(), leave_input())
        .await
        .unwrap();

    let err = state
        .leave
        .decide(
            &identity_for(&peer),
            &client(),
            request.id,
            ReviewDecision::Approved,
            None,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Authorization(_)));

    // the rejection itself lands in the audit trail
    assert_eq!(audit_count(&store, "authorize_deny").await, 1);

    // request untouched
    let stored = state.leave.get(&identity_for(&ta), request.id).await.unwrap();
    assert_eq!(stored.status, RequestStatus::Pending);
}

#[tokio::test]
async fn second_decision_conflicts() {
    let (state, store) = test_state();
    let ta = seed_user(&store, "ta1", Role::TeachingAssistant).await;
    let chair = seed_user(&store, "chair", Role::DepartmentChair).await;
    let dean = seed_user(&store, "dean", Role::Dean).await;

    let request = state
        .leave
        .create(&identity_for(&ta), &client(), leave_input())
        .await
        .unwrap();

    state
        .leave
        .decide(
            &identity_for(&chair),
            &client(),
            request.id,
            ReviewDecision::Approved,
            None,
        )
        .await
        .unwrap();

    let err = state
        .leave
        .decide(
            &identity_for(&dean),
            &client(),
            request.id,
            ReviewDecision::Rejected,
            None,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    // the losing decision leaves no trace
    let stored = state.leave.get(&identity_for(&ta), request.id).await.unwrap();
    assert_eq!(stored.status, RequestStatus::Approved);
    assert_eq!(stored.reviewer_id, Some(chair.id));
    assert_eq!(audit_count(&store, "update_status_leave_request").await, 1);
}

#[tokio::test]
async fn concurrent_decides_have_exactly_one_winner() {
    let (state, store) = test_state();
    let ta = seed_user(&store, "ta1", Role::TeachingAssistant).await;
    let chair = seed_user(&store, "chair", Role::DepartmentChair).await;
    let dean = seed_user(&store, "dean", Role::Dean).await;

    let request = state
        .leave
        .create(&identity_for(&ta), &client(), leave_input())
        .await
        .unwrap();

    let approve = {
        let state = state.clone();
        let identity = identity_for(&chair);
        let id = request.id;
        tokio::spawn(async move {
            state
                .leave
                .decide(&identity, &client(), id, ReviewDecision::Approved, None)
                .await
        })
    };
    let reject = {
        let state = state.clone();
        let identity = identity_for(&dean);
        let id = request.id;
        tokio::spawn(async move {
            state
                .leave
                .decide(&identity, &client(), id, ReviewDecision::Rejected, None)
                .await
        })
    };

    let outcomes = [approve.await.unwrap(), reject.await.unwrap()];
    let wins = outcomes.iter().filter(|r| r.is_ok()).count();
    assert_eq!(wins, 1);
    assert!(outcomes
        .iter()
        .filter(|r| r.is_err())
        .all(|r| matches!(r.as_ref().unwrap_err(), AppError::Conflict(_))));

    // exactly one status-change audit entry and one requester notice
    assert_eq!(audit_count(&store, "update_status_leave_request").await, 1);
    assert_eq!(store.notifications_for(ta.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn delete_is_scoped_to_requester_or_manager() {
    let (state, store) = test_state();
    let ta = seed_user(&store, "ta1", Role::TeachingAssistant).await;
    let peer = seed_user(&store, "ta2", Role::TeachingAssistant).await;
    let admin = seed_user(&store, "root", Role::Admin).await;

    let request = state
        .leave
        .create(&identity_for(&ta), &client(), leave_input())
        .await
        .unwrap();

    let err = state
        .leave
        .delete(&identity_for(&peer), &client(), request.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Authorization(_)));
    assert_eq!(audit_count(&store, "authorize_deny").await, 1);

    // admin holds manage_users and may delete anyone's pending request
    state
        .leave
        .delete(&identity_for(&admin), &client(), request.id)
        .await
        .unwrap();
    assert_eq!(audit_count(&store, "delete_leave_request").await, 1);

    let err = state
        .leave
        .get(&identity_for(&ta), request.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn decided_request_cannot_be_deleted() {
    let (state, store) = test_state();
    let ta = seed_user(&store, "ta1", Role::TeachingAssistant).await;
    let chair = seed_user(&store, "chair", Role::DepartmentChair).await;

    let request = state
        .leave
        .create(&identity_for(&ta), &client(), leave_input())
        .await
        .unwrap();
    state
        .leave
        .decide(
            &identity_for(&chair),
            &client(),
            request.id,
            ReviewDecision::Rejected,
            None,
        )
        .await
        .unwrap();

    let err = state
        .leave
        .delete(&identity_for(&ta), &client(), request.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
async fn listing_is_role_scoped() {
    let (state, store) = test_state();
    let ta1 = seed_user(&store, "ta1", Role::TeachingAssistant).await;
    let ta2 = seed_user(&store, "ta2", Role::TeachingAssistant).await;
    let chair = seed_user(&store, "chair", Role::DepartmentChair).await;

    state
        .leave
        .create(&identity_for(&ta1), &client(), leave_input())
        .await
        .unwrap();
    state
        .leave
        .create(&identity_for(&ta2), &client(), leave_input())
        .await
        .unwrap();

    assert_eq!(state.leave.list_for(&identity_for(&ta1)).await.unwrap().len(), 1);
    assert_eq!(
        state.leave.list_for(&identity_for(&chair)).await.unwrap().len(),
        2
    );

    // cross-requester reads are denied
    let foreign = state.leave.list_for(&identity_for(&ta2)).await.unwrap()[0].id;
    assert_eq!(
        state.leave.list_for(&identity_for(&ta2)).await.unwrap().len(),
        1
    );
    let err = state
        .leave
        .get(&identity_for(&ta1), foreign)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Authorization(_)));
}

#[tokio::test]
async fn leave_stats_counts_by_status_and_type() {
    let (state, store) = test_state();
    let ta = seed_user(&store, "ta1", Role::TeachingAssistant).await;
    let chair = seed_user(&store, "chair", Role::DepartmentChair).await;

    let first = state
        .leave
        .create(&identity_for(&ta), &client(), leave_input())
        .await
        .unwrap();
    let mut vacation = leave_input();
    vacation.leave_type = LeaveType::Vacation;
    state
        .leave
        .create(&identity_for(&ta), &client(), vacation)
        .await
        .unwrap();
    state
        .leave
        .decide(&identity_for(&chair), &client(), first.id, ReviewDecision::Approved, None)
        .await
        .unwrap();

    let stats = state.leave.stats().await.unwrap();
    assert_eq!(stats.total, 2);
    assert_eq!(stats.pending, 1);
    assert_eq!(stats.approved, 1);
    assert_eq!(stats.rejected, 0);
    assert_eq!(stats.by_type["sick"], 1);
    assert_eq!(stats.by_type["vacation"], 1);
}

#[tokio::test]
async fn self_swap_is_rejected() {
    let (state, store) = test_state();
    let ta = seed_user(&store, "ta1", Role::TeachingAssistant).await;
    let course = Uuid::new_v4();
    let assignment = seed_assignment(&store, ta.id, course, AssignmentKind::Task, "grading").await;

    let err = state
        .swap
        .create(
            &identity_for(&ta),
            &client(),
            CreateSwapRequest {
                target_id: ta.id,
                kind: AssignmentKind::Task,
                assignment_id: assignment.id,
                proposed_assignment_id: None,
                reason: "clash".into(),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn swap_create_checks_assignment_ownership_and_kind() {
    let (state, store) = test_state();
    let ta1 = seed_user(&store, "ta1", Role::TeachingAssistant).await;
    let ta2 = seed_user(&store, "ta2", Role::TeachingAssistant).await;
    let course = Uuid::new_v4();
    let theirs = seed_assignment(&store, ta2.id, course, AssignmentKind::Task, "grading").await;
    let exam = seed_assignment(&store, ta1.id, course, AssignmentKind::Exam, "invigilate").await;

    // not the requester's assignment
    let err = state
        .swap
        .create(
            &identity_for(&ta1),
            &client(),
            CreateSwapRequest {
                target_id: ta2.id,
                kind: AssignmentKind::Task,
                assignment_id: theirs.id,
                proposed_assignment_id: None,
                reason: "clash".into(),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    // kind mismatch
    let err = state
        .swap
        .create(
            &identity_for(&ta1),
            &client(),
            CreateSwapRequest {
                target_id: ta2.id,
                kind: AssignmentKind::Task,
                assignment_id: exam.id,
                proposed_assignment_id: None,
                reason: "clash".into(),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn swap_target_receives_notice_and_may_decide() {
    let (state, store) = test_state();
    let ta1 = seed_user(&store, "ta1", Role::TeachingAssistant).await;
    let ta2 = seed_user(&store, "ta2", Role::TeachingAssistant).await;
    let course = Uuid::new_v4();
    let mine = seed_assignment(&store, ta1.id, course, AssignmentKind::Task, "grading").await;

    let request = state
        .swap
        .create(
            &identity_for(&ta1),
            &client(),
            CreateSwapRequest {
                target_id: ta2.id,
                kind: AssignmentKind::Task,
                assignment_id: mine.id,
                proposed_assignment_id: None,
                reason: "clash".into(),
            },
        )
        .await
        .unwrap();

    let target_inbox = store.notifications_for(ta2.id).await.unwrap();
    assert_eq!(target_inbox.len(), 1);
    assert_eq!(target_inbox[0].kind, "swap_request");
    assert!(target_inbox[0].message.contains("ta1"));

    // the named target decides without holding approve_application
    let decided = state
        .swap
        .decide(
            &identity_for(&ta2),
            &client(),
            request.id,
            ReviewDecision::Approved,
            None,
        )
        .await
        .unwrap();
    assert_eq!(decided.status, RequestStatus::Approved);
    assert_eq!(decided.reviewer_id, Some(ta2.id));

    // requester notified of the outcome; target decided so no self-copy
    let requester_inbox = store.notifications_for(ta1.id).await.unwrap();
    assert_eq!(requester_inbox.len(), 1);
    assert_eq!(requester_inbox[0].kind, "swap_status");
    assert_eq!(store.notifications_for(ta2.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn uninvolved_user_cannot_decide_swap() {
    let (state, store) = test_state();
    let ta1 = seed_user(&store, "ta1", Role::TeachingAssistant).await;
    let ta2 = seed_user(&store, "ta2", Role::TeachingAssistant).await;
    let ta3 = seed_user(&store, "ta3", Role::TeachingAssistant).await;
    let course = Uuid::new_v4();
    let mine = seed_assignment(&store, ta1.id, course, AssignmentKind::Task, "grading").await;

    let request = state
        .swap
        .create(
            &identity_for(&ta1),
            &client(),
            CreateSwapRequest {
                target_id: ta2.id,
                kind: AssignmentKind::Task,
                assignment_id: mine.id,
                proposed_assignment_id: None,
                reason: "clash".into(),
            },
        )
        .await
        .unwrap();

    let err = state
        .swap
        .decide(
            &identity_for(&ta3),
            &client(),
            request.id,
            ReviewDecision::Approved,
            None,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Authorization(_)));
    assert_eq!(audit_count(&store, "authorize_deny").await, 1);

    // a reviewer who is neither party may decide under the blanket policy
    let chair = seed_user(&store, "chair", Role::DepartmentChair).await;
    let decided = state
        .swap
        .decide(
            &identity_for(&chair),
            &client(),
            request.id,
            ReviewDecision::Rejected,
            None,
        )
        .await
        .unwrap();
    assert_eq!(decided.status, RequestStatus::Rejected);
}

#[tokio::test]
async fn eligible_targets_excludes_requester_and_pending_parties() {
    let (state, store) = test_state();
    let ta1 = seed_user(&store, "ta1", Role::TeachingAssistant).await;
    let ta2 = seed_user(&store, "ta2", Role::TeachingAssistant).await;
    let ta3 = seed_user(&store, "ta3", Role::TeachingAssistant).await;
    let course = Uuid::new_v4();

    let mine = seed_assignment(&store, ta1.id, course, AssignmentKind::Task, "grading").await;
    seed_assignment(&store, ta2.id, course, AssignmentKind::Task, "grading").await;
    seed_assignment(&store, ta3.id, course, AssignmentKind::Task, "grading").await;
    // exam duty in the same course never qualifies for a task swap
    let examiner = seed_user(&store, "ta4", Role::TeachingAssistant).await;
    seed_assignment(&store, examiner.id, course, AssignmentKind::Exam, "invigilate").await;

    let candidates = state
        .swap
        .eligible_targets(ta1.id, mine.id, AssignmentKind::Task)
        .await
        .unwrap();
    let mut ids: Vec<Uuid> = candidates.iter().map(|u| u.id).collect();
    ids.sort();
    let mut expected = vec![ta2.id, ta3.id];
    expected.sort();
    assert_eq!(ids, expected);

    // once ta2 is party to a pending swap on this assignment, only ta3 remains
    state
        .swap
        .create(
            &identity_for(&ta1),
            &client(),
            CreateSwapRequest {
                target_id: ta2.id,
                kind: AssignmentKind::Task,
                assignment_id: mine.id,
                proposed_assignment_id: None,
                reason: "clash".into(),
            },
        )
        .await
        .unwrap();
    let candidates = state
        .swap
        .eligible_targets(ta1.id, mine.id, AssignmentKind::Task)
        .await
        .unwrap();
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].id, ta3.id);
}

#[tokio::test]
async fn eligible_targets_empty_when_no_peer_exists() {
    let (state, store) = test_state();
    let ta = seed_user(&store, "ta1", Role::TeachingAssistant).await;
    let course = Uuid::new_v4();
    let mine = seed_assignment(&store, ta.id, course, AssignmentKind::Task, "grading").await;

    let candidates = state
        .swap
        .eligible_targets(ta.id, mine.id, AssignmentKind::Task)
        .await
        .unwrap();
    assert!(candidates.is_empty());

    // kind mismatch resolves to not-found, not an empty list
    let err = state
        .swap
        .eligible_targets(ta.id, mine.id, AssignmentKind::Exam)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn eligible_targets_skips_inactive_users() {
    let (state, store) = test_state();
    let ta1 = seed_user(&store, "ta1", Role::TeachingAssistant).await;
    let mut ghost = User::new("ghost", "ghost@uni.edu", Role::TeachingAssistant);
    ghost.is_active = false;
    store.insert_user(ghost.clone()).await.unwrap();
    let course = Uuid::new_v4();
    let mine = seed_assignment(&store, ta1.id, course, AssignmentKind::Task, "grading").await;
    seed_assignment(&store, ghost.id, course, AssignmentKind::Task, "grading").await;

    let candidates = state
        .swap
        .eligible_targets(ta1.id, mine.id, AssignmentKind::Task)
        .await
        .unwrap();
    assert!(candidates.is_empty());
}

#[tokio::test]
async fn proposed_counterpart_must_match_course_and_kind() {
    let (state, store) = test_state();
    let ta1 = seed_user(&store, "ta1", Role::TeachingAssistant).await;
    let ta2 = seed_user(&store, "ta2", Role::TeachingAssistant).await;
    let course = Uuid::new_v4();
    let other_course = Uuid::new_v4();

    let mine = seed_assignment(&store, ta1.id, course, AssignmentKind::Task, "grading").await;
    let elsewhere =
        seed_assignment(&store, ta2.id, other_course, AssignmentKind::Task, "grading").await;
    let theirs = seed_assignment(&store, ta2.id, course, AssignmentKind::Task, "grading").await;

    let err = state
        .swap
        .create(
            &identity_for(&ta1),
            &client(),
            CreateSwapRequest {
                target_id: ta2.id,
                kind: AssignmentKind::Task,
                assignment_id: mine.id,
                proposed_assignment_id: Some(elsewhere.id),
                reason: "clash".into(),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let request = state
        .swap
        .create(
            &identity_for(&ta1),
            &client(),
            CreateSwapRequest {
                target_id: ta2.id,
                kind: AssignmentKind::Task,
                assignment_id: mine.id,
                proposed_assignment_id: Some(theirs.id),
                reason: "clash".into(),
            },
        )
        .await
        .unwrap();
    assert_eq!(request.proposed_assignment_id, Some(theirs.id));
}
