//! Room handlers

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use uuid::Uuid;
use validator::Validate;

use core_kernel::{Money, RoomId};
use domain_occupancy::room::{Building, NewRoom, RoomStatus, RoomType, RoomUpdate};
use domain_occupancy::RoomQuery;

use crate::auth::Claims;
use crate::dto::rooms::{
    CreateRoomRequest, ListRoomsParams, RoomResponse, UpdateRoomRequest,
};
use crate::dto::ApiResponse;
use crate::error::ApiError;
use crate::handlers::require_admin;
use crate::AppState;

/// Creates a room
pub async fn create_room(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(request): Json<CreateRoomRequest>,
) -> Result<Json<ApiResponse<RoomResponse>>, ApiError> {
    require_admin(&claims, &state)?;
    request
        .validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let input = NewRoom {
        building: request.building.parse::<Building>()?,
        floor: request.floor,
        room_number: request.room_number,
        room_type: request.room_type.parse::<RoomType>()?,
        price: Money::inr(request.price),
        capacity: request.capacity,
        amenities: request.amenities,
    };

    let room = state.rooms.create_room(input).await?;
    Ok(Json(ApiResponse::ok(
        "Room created",
        RoomResponse::from(room),
    )))
}

/// Lists rooms, optionally with resident summaries
pub async fn list_rooms(
    State(state): State<AppState>,
    Query(params): Query<ListRoomsParams>,
) -> Result<Json<ApiResponse<Vec<RoomResponse>>>, ApiError> {
    let query = RoomQuery {
        building: params
            .building
            .as_deref()
            .map(str::parse::<Building>)
            .transpose()?,
        status: params
            .status
            .as_deref()
            .map(str::parse::<RoomStatus>)
            .transpose()?,
        include_archived: false,
    };

    let listing = state.rooms.list_rooms(query, params.with_residents).await?;
    let rooms: Vec<RoomResponse> = listing
        .into_iter()
        .map(|row| RoomResponse::from_listing(row, params.with_residents))
        .collect();

    Ok(Json(ApiResponse::ok("Rooms fetched", rooms)))
}

/// Updates a room
pub async fn update_room(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateRoomRequest>,
) -> Result<Json<ApiResponse<RoomResponse>>, ApiError> {
    require_admin(&claims, &state)?;
    request
        .validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let update = RoomUpdate {
        building: request
            .building
            .as_deref()
            .map(str::parse::<Building>)
            .transpose()?,
        floor: request.floor,
        room_number: request.room_number,
        room_type: request
            .room_type
            .as_deref()
            .map(str::parse::<RoomType>)
            .transpose()?,
        price: request.price.map(Money::inr),
        capacity: request.capacity,
        amenities: request.amenities,
        status: request
            .status
            .as_deref()
            .map(str::parse::<RoomStatus>)
            .transpose()?,
    };

    let room = state
        .rooms
        .update_room(RoomId::from_uuid(id), update)
        .await?;
    Ok(Json(ApiResponse::ok(
        "Room updated",
        RoomResponse::from(room),
    )))
}

/// Archives a room; only permitted while empty
pub async fn delete_room(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    require_admin(&claims, &state)?;
    state.rooms.delete_room(RoomId::from_uuid(id)).await?;
    Ok(Json(ApiResponse::message("Room deleted")))
}
