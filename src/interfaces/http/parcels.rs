use super::error::ApiError;
use super::{AppState, EmailFilter, Envelope};
use crate::domain::parcel::{NewParcel, Parcel, ParcelId};
use crate::error::PaymentError;
use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde::Serialize;
use tracing::info;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Deleted {
    pub deleted_id: ParcelId,
}

pub async fn list_parcels(
    State(state): State<AppState>,
    query: Result<Query<EmailFilter>, QueryRejection>,
) -> Result<Json<Envelope<Vec<Parcel>>>, ApiError> {
    let Query(filter) = query?;
    let parcels = state.parcels.list(filter.email.as_deref()).await?;
    Ok(Envelope::ok("Parcels found successfully.", parcels))
}

pub async fn create_parcel(
    State(state): State<AppState>,
    body: Result<Json<NewParcel>, JsonRejection>,
) -> Result<(StatusCode, Json<Envelope<Parcel>>), ApiError> {
    let Json(new) = body?;
    new.validate()?;
    let parcel = state.parcels.create(new).await?;
    info!(parcel_id = %parcel.id, "Parcel created");
    Ok((
        StatusCode::CREATED,
        Envelope::ok("Parcel created successfully.", parcel),
    ))
}

pub async fn get_parcel(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Envelope<Parcel>>, ApiError> {
    let id = ParcelId::from(id);
    let parcel = state
        .parcels
        .get(&id)
        .await?
        .ok_or(PaymentError::ParcelNotFound(id))?;
    Ok(Envelope::ok("Parcel found successfully.", parcel))
}

pub async fn delete_parcel(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Envelope<Deleted>>, ApiError> {
    let id = ParcelId::from(id);
    if !state.parcels.delete(&id).await? {
        return Err(PaymentError::ParcelNotFound(id).into());
    }
    info!(parcel_id = %id, "Parcel deleted");
    Ok(Envelope::ok(
        "Parcel deleted successfully.",
        Deleted { deleted_id: id },
    ))
}
