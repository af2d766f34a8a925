//! Participant links, batch validation and schedule conflict checks

mod common;

use common::{Harness, at, schedule, template};
use renval_core::ErrorKind;
use renval_core::model::{
    AssessmentQuery, AssessmentStatus, NewAssessmentBatch, NewParticipant, ParticipantRole,
    ScheduledParticipant, expiry_for,
};

fn total(h: &Harness) -> u32 {
    h.renval
        .assessments
        .list(&AssessmentQuery::new())
        .unwrap()
        .metadata
        .total
}

#[tokio::test]
async fn add_links_a_person_once() {
    let h = Harness::new();
    let f = h.single().await;
    let observer = h.person("Dewi Lestari", "971822001I");

    let view = h
        .renval
        .participants
        .add(
            f.id(),
            NewParticipant {
                person_id: observer.id.clone(),
                role_id: ParticipantRole::Evaluator.role_id(),
                schedule: Some(schedule()),
            },
        )
        .unwrap();
    assert_eq!(view.link.role, ParticipantRole::Evaluator);
    assert_eq!(view.link.schedule, None);
    assert_eq!(view.link.status, None);
    assert_eq!(view.person.nip, "971822001I");

    let err = h
        .renval
        .participants
        .add(
            f.id(),
            NewParticipant {
                person_id: observer.id.clone(),
                role_id: ParticipantRole::Participant.role_id(),
                schedule: None,
            },
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(err.to_string(), "Participant already exists in this assessment");
}

#[tokio::test]
async fn add_checks_assessment_role_and_person() {
    let h = Harness::new();
    let f = h.single().await;
    let person = h.person("Dewi Lestari", "971822001I");
    let input = |person_id: &str, role_id| NewParticipant {
        person_id: person_id.to_string(),
        role_id,
        schedule: None,
    };

    let err = h
        .renval
        .participants
        .add("missing", input(&person.id, 1))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let err = h.renval.participants.add(f.id(), input(&person.id, 9)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(err.to_string(), "Assessment role not found");

    let err = h.renval.participants.add(f.id(), input("nobody", 1)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn added_participant_with_schedule_is_scheduled() {
    let h = Harness::new();
    let f = h.single().await;
    let person = h.person("Dewi Lestari", "971822001I");
    let when = at(2025, 6, 2, 10);

    let view = h
        .renval
        .participants
        .add(
            f.id(),
            NewParticipant {
                person_id: person.id,
                role_id: ParticipantRole::Participant.role_id(),
                schedule: Some(when),
            },
        )
        .unwrap();

    assert_eq!(view.link.status, Some(AssessmentStatus::Scheduled));
    assert_eq!(view.link.expiry, Some(expiry_for(when)));
}

#[tokio::test]
async fn batch_rejects_participant_as_evaluator() {
    let h = Harness::new();
    let p = h.person("Angga Estibrata", "921722596I");
    let e = h.person("Andi Budimansyah", "881721674I");

    let err = h.batch(&[(&p, schedule())], &[&e, &p]).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BadRequest);
    assert_eq!(err.to_string(), "A participant cannot be an evaluator");
    assert_eq!(total(&h), 0);
}

#[tokio::test]
async fn batch_rejects_duplicate_evaluators() {
    let h = Harness::new();
    let p = h.person("Angga Estibrata", "921722596I");
    let e = h.person("Andi Budimansyah", "881721674I");

    let err = h.batch(&[(&p, schedule())], &[&e, &e]).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BadRequest);
    assert_eq!(total(&h), 0);
}

#[tokio::test]
async fn batch_with_unknown_person_writes_nothing() {
    let h = Harness::new();
    let p = h.person("Angga Estibrata", "921722596I");
    let e = h.person("Andi Budimansyah", "881721674I");

    let batch = NewAssessmentBatch {
        assessment: template(),
        participants: vec![
            ScheduledParticipant {
                participant_id: p.id.clone(),
                schedule: schedule(),
            },
            ScheduledParticipant {
                participant_id: "ghost".to_string(),
                schedule: schedule(),
            },
        ],
        evaluators: vec![e.id.clone()],
    };
    let err = h.renval.participants.create_batch(batch).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(err.to_string(), "One or more participants not found");

    let batch = NewAssessmentBatch {
        assessment: template(),
        participants: vec![ScheduledParticipant {
            participant_id: p.id.clone(),
            schedule: schedule(),
        }],
        evaluators: vec!["ghost".to_string()],
    };
    let err = h.renval.participants.create_batch(batch).await.unwrap_err();
    assert_eq!(err.to_string(), "One or more evaluators not found");
    assert_eq!(total(&h), 0);
}

#[tokio::test]
async fn batch_validates_its_shape() {
    let h = Harness::new();
    let p = h.person("Angga Estibrata", "921722596I");
    let evaluators: Vec<_> = (0..3)
        .map(|i| h.person(&format!("Evaluator {i}"), &format!("80000{i}I")))
        .collect();

    let err = h.batch(&[], &[&evaluators[0]]).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let err = h.batch(&[(&p, schedule())], &[]).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let all: Vec<_> = evaluators.iter().collect();
    let err = h.batch(&[(&p, schedule())], &all).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let mut blank = template();
    blank.title = " ".to_string();
    let err = h
        .renval
        .participants
        .create_batch(NewAssessmentBatch {
            assessment: blank,
            participants: vec![ScheduledParticipant {
                participant_id: p.id.clone(),
                schedule: schedule(),
            }],
            evaluators: vec![evaluators[0].id.clone()],
        })
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(total(&h), 0);
}

#[tokio::test]
async fn evaluator_links_refuse_status_and_schedule() {
    let h = Harness::new();
    let f = h.single().await;
    let evaluator_link = f
        .assessment
        .participants
        .iter()
        .find(|v| v.link.role == ParticipantRole::Evaluator)
        .unwrap();

    let err = h
        .renval
        .participants
        .update_status(f.id(), &evaluator_link.link.id, AssessmentStatus::Done)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BadRequest);
    assert_eq!(
        err.to_string(),
        "Status can only be updated for participants, not evaluators"
    );

    let err = h
        .renval
        .participants
        .update_schedule(f.id(), &evaluator_link.link.id, schedule())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BadRequest);
}

#[tokio::test]
async fn participant_link_status_is_independent() {
    let h = Harness::new();
    let f = h.single().await;
    let link = &f.assessment.participants[0].link;
    assert_eq!(link.role, ParticipantRole::Participant);

    let updated = h
        .renval
        .participants
        .update_status(f.id(), &link.id, AssessmentStatus::Done)
        .unwrap();
    assert_eq!(updated.status, Some(AssessmentStatus::Done));
    assert_eq!(
        h.renval.assessments.get(f.id()).unwrap().assessment.status,
        AssessmentStatus::Created
    );

    let when = at(2025, 7, 1, 9);
    let rescheduled = h
        .renval
        .participants
        .update_schedule(f.id(), &link.id, when)
        .unwrap();
    assert_eq!(rescheduled.schedule, Some(when));
    assert_eq!(rescheduled.expiry, Some(expiry_for(when)));
    assert_eq!(rescheduled.status, Some(AssessmentStatus::Scheduled));
}

#[tokio::test]
async fn remove_detaches_but_keeps_evaluations() {
    let h = Harness::new();
    let f = h.single().await;
    let evaluator_link = f
        .assessment
        .participants
        .iter()
        .find(|v| v.link.role == ParticipantRole::Evaluator)
        .unwrap();

    h.renval
        .participants
        .remove(f.id(), &evaluator_link.link.id)
        .unwrap();

    let detail = h.renval.assessments.get(f.id()).unwrap();
    assert_eq!(detail.participants.len(), 2);
    assert_eq!(detail.evaluations.len(), 2);

    let err = h
        .renval
        .participants
        .remove(f.id(), &evaluator_link.link.id)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(err.to_string(), "Participant not found in this assessment");
}

#[tokio::test]
async fn link_ids_are_scoped_to_their_assessment() {
    let h = Harness::new();
    let f = h.single().await;
    let other = h.person("Sabar Subagja", "931721678I");
    let created = h
        .batch(&[(&other, schedule())], &[&f.evaluators[0]])
        .await
        .unwrap();
    let foreign_link = &created[0].participants[0].link.id;

    let err = h.renval.participants.remove(f.id(), foreign_link).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn schedule_conflicts_look_two_hours_ahead() {
    let h = Harness::new();
    let f = h.single().await;
    let person = &f.participant.id;

    let conflicts = h
        .renval
        .participants
        .check_schedule_conflicts(person, at(2025, 3, 10, 8), None)
        .unwrap();
    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].id, f.id());
    assert_eq!(conflicts[0].schedule, schedule());

    let later = h
        .renval
        .participants
        .check_schedule_conflicts(person, at(2025, 3, 10, 12), None)
        .unwrap();
    assert!(later.is_empty());

    let excluded = h
        .renval
        .participants
        .check_schedule_conflicts(person, at(2025, 3, 10, 8), Some(f.id()))
        .unwrap();
    assert!(excluded.is_empty());
}

#[tokio::test]
async fn schedule_conflicts_cover_evaluators_and_skip_canceled() {
    let h = Harness::new();
    let f = h.single().await;
    let evaluator = &f.evaluators[0].id;

    let conflicts = h
        .renval
        .participants
        .check_schedule_conflicts(evaluator, schedule(), None)
        .unwrap();
    assert_eq!(conflicts.len(), 1);

    h.advance(f.id(), &[AssessmentStatus::Canceled]).await;
    let conflicts = h
        .renval
        .participants
        .check_schedule_conflicts(evaluator, schedule(), None)
        .unwrap();
    assert!(conflicts.is_empty());
}
