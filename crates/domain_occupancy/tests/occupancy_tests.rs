//! Tests for the occupancy domain types

use core_kernel::Money;
use domain_occupancy::{
    lowest_free_bed, Building, NewRoom, Room, RoomStatus, RoomType, RoomUpdate, TransferPlan,
    Resident,
};
use rust_decimal_macros::dec;

fn double_room() -> Room {
    Room::new(NewRoom {
        building: Building::A,
        floor: 1,
        room_number: "101".to_string(),
        room_type: RoomType::Double,
        price: Money::inr(dec!(8000)),
        capacity: 2,
        amenities: vec!["wifi".to_string(), "ac".to_string()],
    })
    .unwrap()
}

#[test]
fn capacity_two_fills_in_bed_order() {
    // Room capacity=2: A takes bed 1, B takes bed 2, then no bed is free
    let room = double_room();

    let first = lowest_free_bed(&[], room.capacity);
    assert_eq!(first, Some(1));

    let second = lowest_free_bed(&[1], room.capacity);
    assert_eq!(second, Some(2));

    let third = lowest_free_bed(&[1, 2], room.capacity);
    assert_eq!(third, None);
}

#[test]
fn occupancy_never_exceeds_capacity_via_updates() {
    let mut room = double_room();
    room.current_occupancy = 2;

    // Shrinking under the occupants is rejected
    assert!(room
        .apply_update(RoomUpdate {
            capacity: Some(1),
            ..Default::default()
        })
        .is_err());

    // Growing is fine and reopens the room
    room.apply_update(RoomUpdate {
        capacity: Some(3),
        ..Default::default()
    })
    .unwrap();
    assert_eq!(room.status, RoomStatus::Available);
}

#[test]
fn full_room_stops_accepting_assignments() {
    let mut room = double_room();
    assert!(room.accepts_assignments());

    room.current_occupancy = 2;
    room.status = room.derive_status();
    assert_eq!(room.status, RoomStatus::Full);
    assert!(!room.accepts_assignments());
}

#[test]
fn maintenance_blocks_assignment_even_when_empty() {
    let mut room = double_room();
    room.apply_update(RoomUpdate {
        status: Some(RoomStatus::Maintenance),
        ..Default::default()
    })
    .unwrap();

    assert!(!room.accepts_assignments());
}

#[test]
fn transfer_plan_rejects_maintenance_target() {
    let source = double_room();
    let mut target = Room::new(NewRoom {
        building: Building::B,
        floor: 2,
        room_number: "204".to_string(),
        room_type: RoomType::Triple,
        price: Money::inr(dec!(9500)),
        capacity: 3,
        amenities: vec![],
    })
    .unwrap();
    target.status = RoomStatus::Maintenance;

    let mut resident = Resident::new("Asha Verma", "asha@example.com");
    resident.assign(source.room_id, 1).unwrap();

    assert!(TransferPlan::validate(&resident, &target).is_err());
}

#[test]
fn room_serializes_with_label_fields() {
    let room = double_room();
    let json = serde_json::to_value(&room).unwrap();

    assert_eq!(json["building"], "A");
    assert_eq!(json["room_number"], "101");
    assert_eq!(json["status"], "available");
    assert_eq!(json["lifecycle"], "active");
}
