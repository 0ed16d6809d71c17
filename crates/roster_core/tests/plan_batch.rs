mod common;

use common::*;
use roster_core::{Period, PlanService, RosterError, SlotStatus};
use rusqlite::params;

fn march_until(day: u32) -> Period {
    Period::new(date(2024, 3, 1), date(2024, 3, day)).unwrap()
}

#[test]
fn fills_every_role_per_meeting_and_is_idempotent() {
    let conn = fresh_db();
    let task = add_task(&conn, "Service", 1);
    let reader = add_role(&conn, task, "Reader", 1);
    let usher = add_role(&conn, task, "Usher", 2);
    let ada = add_person(&conn, "Ada", "Lovelace");
    let bob = add_person(&conn, "Bob", "Babbage");
    for person in [ada, bob] {
        make_eligible(&conn, person, reader);
        make_eligible(&conn, person, usher);
    }
    add_meeting(&conn, date(2024, 3, 1));
    add_meeting(&conn, date(2024, 3, 8));

    let service = PlanService::new(&conn);
    let first = service.create_plan_data(&march_until(31)).unwrap();
    assert_eq!(first.created().count(), 4);
    assert_eq!(first.assignments.len(), 4);
    assert!(first
        .assignments
        .iter()
        .all(|assignment| assignment.person.is_some()));

    let second = service.create_plan_data(&march_until(31)).unwrap();
    assert_eq!(second.created().count(), 0);
    assert!(second
        .slots
        .iter()
        .all(|slot| matches!(slot.status, SlotStatus::Skipped { .. })));
    assert_eq!(count_assignments(&conn), 4);
    assert_eq!(second.assignments, first.assignments);
}

#[test]
fn nobody_takes_two_duties_at_the_same_meeting() {
    let conn = fresh_db();
    let task = add_task(&conn, "Service", 1);
    let reader = add_role(&conn, task, "Reader", 1);
    let usher = add_role(&conn, task, "Usher", 2);
    let ada = add_person(&conn, "Ada", "Lovelace");
    make_eligible(&conn, ada, reader);
    make_eligible(&conn, ada, usher);
    let meeting = add_meeting(&conn, date(2024, 3, 1));

    let outcome = PlanService::new(&conn)
        .create_plan_data(&march_until(1))
        .unwrap();

    assert_eq!(outcome.created().count(), 2);
    assert_eq!(person_at(&conn, meeting, reader), Some(ada));
    assert_eq!(person_at(&conn, meeting, usher), None);
}

#[test]
fn absent_people_are_never_picked() {
    let conn = fresh_db();
    let reader = single_role(&conn);
    let ada = add_person(&conn, "Ada", "Lovelace");
    let bob = add_person(&conn, "Bob", "Babbage");
    let cy = add_person(&conn, "Cy", "Clarke");
    for person in [ada, bob, cy] {
        make_eligible(&conn, person, reader);
    }
    // 2024-03-01 is a Friday.
    let friday = add_meeting(&conn, date(2024, 3, 1));
    let sunday = add_meeting(&conn, date(2024, 3, 3));
    add_absence(&conn, ada, friday);
    add_recurring_absence(&conn, bob, 5);
    add_recurring_absence(&conn, cy, 0);

    PlanService::new(&conn)
        .create_plan_data(&march_until(3))
        .unwrap();

    assert_eq!(person_at(&conn, friday, reader), Some(cy));
    assert_eq!(person_at(&conn, sunday, reader), Some(ada));
}

#[test]
fn slot_stays_open_when_nobody_is_available() {
    let conn = fresh_db();
    let reader = single_role(&conn);
    let ada = add_person(&conn, "Ada", "Lovelace");
    make_eligible(&conn, ada, reader);
    let meeting = add_meeting(&conn, date(2024, 3, 1));
    add_absence(&conn, ada, meeting);

    let outcome = PlanService::new(&conn)
        .create_plan_data(&march_until(1))
        .unwrap();

    assert!(matches!(
        outcome.slots[0].status,
        SlotStatus::Created {
            person_id: None,
            ..
        }
    ));
    assert_eq!(count_assignments(&conn), 1);
    assert_eq!(person_at(&conn, meeting, reader), None);
}

#[test]
fn least_loaded_person_in_the_month_goes_first_then_lower_id() {
    let conn = fresh_db();
    let reader = single_role(&conn);
    let ada = add_person(&conn, "Ada", "Lovelace");
    let bob = add_person(&conn, "Bob", "Babbage");
    make_eligible(&conn, ada, reader);
    make_eligible(&conn, bob, reader);
    let first = add_meeting(&conn, date(2024, 3, 1));
    let second = add_meeting(&conn, date(2024, 3, 8));
    let third = add_meeting(&conn, date(2024, 3, 15));
    // Same month, outside the planned range: these still weigh on fairness.
    for day in [30, 31] {
        let late = add_meeting(&conn, date(2024, 3, day));
        add_assignment(&conn, late, Some(reader), Some(bob));
    }

    PlanService::new(&conn)
        .create_plan_data(&march_until(29))
        .unwrap();

    assert_eq!(person_at(&conn, first, reader), Some(ada));
    assert_eq!(person_at(&conn, second, reader), Some(ada));
    // Both now hold two Reader duties in March; the lower id wins.
    assert_eq!(person_at(&conn, third, reader), Some(ada));
}

#[test]
fn per_role_count_breaks_ties_on_total_load() {
    let conn = fresh_db();
    let task = add_task(&conn, "Service", 1);
    let reader = add_role(&conn, task, "Reader", 1);
    let usher = add_role(&conn, task, "Usher", 2);
    let ada = add_person(&conn, "Ada", "Lovelace");
    let bob = add_person(&conn, "Bob", "Babbage");
    make_eligible(&conn, ada, reader);
    make_eligible(&conn, bob, reader);
    let first = add_meeting(&conn, date(2024, 3, 1));
    let second = add_meeting(&conn, date(2024, 3, 8));
    let third = add_meeting(&conn, date(2024, 3, 15));
    for day in [30, 31] {
        let late = add_meeting(&conn, date(2024, 3, day));
        add_assignment(&conn, late, Some(usher), Some(bob));
    }

    PlanService::new(&conn)
        .create_plan_data(&march_until(29))
        .unwrap();

    assert_eq!(person_at(&conn, first, reader), Some(ada));
    assert_eq!(person_at(&conn, second, reader), Some(ada));
    // Two duties each, but Bob has never read this month.
    assert_eq!(person_at(&conn, third, reader), Some(bob));
    assert_eq!(person_at(&conn, third, usher), None);
}

#[test]
fn previous_months_do_not_count_towards_fairness() {
    let conn = fresh_db();
    let reader = single_role(&conn);
    let ada = add_person(&conn, "Ada", "Lovelace");
    let bob = add_person(&conn, "Bob", "Babbage");
    make_eligible(&conn, ada, reader);
    make_eligible(&conn, bob, reader);
    for day in [2, 9, 16] {
        let february = add_meeting(&conn, date(2024, 2, day));
        add_assignment(&conn, february, Some(reader), Some(bob));
    }
    let late_march = add_meeting(&conn, date(2024, 3, 31));
    add_assignment(&conn, late_march, Some(reader), Some(ada));
    let meeting = add_meeting(&conn, date(2024, 3, 1));

    PlanService::new(&conn)
        .create_plan_data(&march_until(1))
        .unwrap();

    assert_eq!(person_at(&conn, meeting, reader), Some(bob));
}

#[test]
fn tagged_meeting_gets_a_single_marker_row() {
    let conn = fresh_db();
    let task = add_task(&conn, "Service", 1);
    let reader = add_role(&conn, task, "Reader", 1);
    add_role(&conn, task, "Usher", 2);
    let ada = add_person(&conn, "Ada", "Lovelace");
    make_eligible(&conn, ada, reader);
    add_meeting(&conn, date(2024, 3, 1));
    let holiday = add_tagged_meeting(&conn, date(2024, 3, 8), "Holiday");

    let service = PlanService::new(&conn);
    let outcome = service.create_plan_data(&march_until(31)).unwrap();

    assert_eq!(outcome.slots.len(), 3);
    let marker = outcome
        .assignments
        .iter()
        .find(|assignment| assignment.meeting.id == holiday)
        .unwrap();
    assert!(marker.is_marker());
    assert!(marker.person.is_none());
    assert_eq!(
        marker.meeting.tag.as_ref().map(|tag| tag.descr.as_str()),
        Some("Holiday")
    );
    assert_eq!(
        outcome
            .assignments
            .iter()
            .filter(|assignment| assignment.meeting.id == holiday)
            .count(),
        1
    );

    service.create_plan_data(&march_until(31)).unwrap();
    assert_eq!(count_assignments(&conn), 3);
}

#[test]
fn failing_slot_is_reported_and_other_slots_survive() {
    let conn = fresh_db();
    let task = add_task(&conn, "Service", 1);
    let reader = add_role(&conn, task, "Reader", 1);
    let usher = add_role(&conn, task, "Usher", 2);
    let ada = add_person(&conn, "Ada", "Lovelace");
    make_eligible(&conn, ada, reader);
    let meeting = add_meeting(&conn, date(2024, 3, 1));
    conn.execute_batch(&format!(
        "CREATE TRIGGER fail_usher BEFORE INSERT ON assignments
         WHEN NEW.role_id = {usher}
         BEGIN SELECT RAISE(ABORT, 'usher slot rejected'); END;"
    ))
    .unwrap();

    let outcome = PlanService::new(&conn)
        .create_plan_data(&march_until(1))
        .unwrap();

    assert_eq!(outcome.created().count(), 1);
    let failed: Vec<_> = outcome.failed().collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].role_id, Some(usher));
    match &failed[0].status {
        SlotStatus::Failed { error_code, reason } => {
            assert_eq!(*error_code, "slot_persist_failed");
            assert!(reason.contains("usher slot rejected"));
        }
        other => panic!("unexpected status: {other:?}"),
    }
    assert_eq!(count_assignments(&conn), 1);
    assert_eq!(person_at(&conn, meeting, reader), Some(ada));
}

#[test]
fn slot_filled_by_another_writer_is_reported_as_conflict() {
    let conn = fresh_db();
    let task = add_task(&conn, "Service", 1);
    let reader = add_role(&conn, task, "Reader", 1);
    let usher = add_role(&conn, task, "Usher", 2);
    let ada = add_person(&conn, "Ada", "Lovelace");
    let bob = add_person(&conn, "Bob", "Babbage");
    make_eligible(&conn, ada, reader);
    let first = add_meeting(&conn, date(2024, 3, 1));
    let second = add_meeting(&conn, date(2024, 3, 8));
    // Another writer takes the Usher slot of the first meeting between the
    // empty-slot check and the insert.
    conn.execute_batch(&format!(
        "CREATE TRIGGER usher_taken_first BEFORE INSERT ON assignments
         WHEN NEW.meeting_id = {first} AND NEW.role_id = {usher}
         BEGIN
             INSERT INTO assignments (meeting_id, role_id, person_id)
             VALUES (NEW.meeting_id, NEW.role_id, {bob});
         END;"
    ))
    .unwrap();

    let outcome = PlanService::new(&conn)
        .create_plan_data(&march_until(31))
        .unwrap();

    let failed: Vec<_> = outcome.failed().collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].meeting_id, first);
    assert_eq!(failed[0].role_id, Some(usher));
    match &failed[0].status {
        SlotStatus::Failed { error_code, reason } => {
            assert_eq!(*error_code, "slot_conflict");
            assert!(reason.contains("UNIQUE"));
        }
        other => panic!("unexpected status: {other:?}"),
    }
    assert_eq!(outcome.created().count(), 3);
    assert_eq!(person_at(&conn, first, reader), Some(ada));
    assert_eq!(person_at(&conn, second, reader), Some(ada));
    assert_eq!(count_assignments(&conn), 3);
}

#[test]
fn planning_marks_only_overlapping_artifacts_dirty() {
    let conn = fresh_db();
    single_role(&conn);
    add_meeting(&conn, date(2024, 3, 15));
    let insert = "INSERT INTO artifacts (start_date, end_date, name, file_path)
                  VALUES (?1, ?2, 'export', '/tmp/export.html');";
    conn.execute(insert, params![date(2024, 3, 1), date(2024, 3, 31)])
        .unwrap();
    conn.execute(insert, params![date(2024, 5, 1), date(2024, 5, 31)])
        .unwrap();

    PlanService::new(&conn)
        .create_plan_data(&Period::new(date(2024, 3, 10), date(2024, 4, 10)).unwrap())
        .unwrap();

    let dirty: Vec<(String, i64)> = conn
        .prepare("SELECT start_date, data_changed FROM artifacts ORDER BY start_date;")
        .unwrap()
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(
        dirty,
        vec![("2024-03-01".to_string(), 1), ("2024-05-01".to_string(), 0)]
    );
}

#[test]
fn plan_reads_return_ordered_details() {
    let conn = fresh_db();
    let service_task = add_task(&conn, "Service", 1);
    let music_task = add_task(&conn, "Music", 2);
    let organ = add_role(&conn, music_task, "Organ", 1);
    let reader = add_role(&conn, service_task, "Reader", 1);
    let later = add_meeting(&conn, date(2024, 3, 8));
    let earlier = add_meeting(&conn, date(2024, 3, 1));
    add_assignment(&conn, later, Some(reader), None);
    let organ_row = add_assignment(&conn, earlier, Some(organ), None);
    add_assignment(&conn, earlier, Some(reader), None);

    let service = PlanService::new(&conn);
    let plan = service.get_plan(&march_until(31)).unwrap();
    let order: Vec<_> = plan
        .iter()
        .map(|row| (row.meeting.id, row.role.as_ref().map(|role| role.id)))
        .collect();
    assert_eq!(
        order,
        vec![
            (earlier, Some(reader)),
            (earlier, Some(organ)),
            (later, Some(reader)),
        ]
    );

    let element = service.get_plan_element(organ_row).unwrap();
    assert_eq!(element.task.map(|task| task.descr), Some("Music".to_string()));

    let err = service.get_plan_element(9_999).unwrap_err();
    assert!(matches!(
        err,
        RosterError::NotFound {
            entity: "assignment",
            id: 9_999
        }
    ));
}

#[test]
fn marker_rows_serialize_without_role_or_person() {
    let conn = fresh_db();
    single_role(&conn);
    add_tagged_meeting(&conn, date(2024, 3, 8), "Holiday");

    let outcome = PlanService::new(&conn)
        .create_plan_data(&march_until(31))
        .unwrap();
    let json = serde_json::to_value(&outcome).unwrap();

    let marker = &json["assignments"][0];
    assert_eq!(marker["meeting"]["date"], "2024-03-08");
    assert_eq!(marker["meeting"]["tag"]["descr"], "Holiday");
    assert!(marker.get("role").is_none());
    assert!(marker.get("person").is_none());
    assert_eq!(json["slots"][0]["status"], "created");
    assert!(json["slots"][0]["role_id"].is_null());
}
