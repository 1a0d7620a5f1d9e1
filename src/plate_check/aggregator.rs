//! Detail aggregation for a found plate
//!
//! Gathers the registration form, the vehicle's plate history and the owner
//! record. Every sub-lookup fails independently: a failure is logged and the
//! corresponding field is left empty, so the result is always a (possibly
//! partial) [`DetailPack`].

use crate::models::Plate;
use crate::socket_server::protocol::DetailPack;

use super::lookups::Lookups;

/// Build the detail pack for `plate`.
///
/// The owner lookup runs only when a registration form was obtained. A failed
/// form lookup and a missing form both skip it.
pub async fn gather_details(lookups: &Lookups, plate: &Plate) -> DetailPack {
    let vehicle_id = plate.vehicle_id;

    let registration_form = match lookups.registration_form_by_vehicle(vehicle_id).await {
        Ok(form) => form,
        Err(e) => {
            tracing::warn!(vehicle_id, error = %e, "Registration form lookup failed");
            None
        }
    };

    // Store order is kept: most recently issued first.
    let plates = match lookups.plates_by_vehicle(vehicle_id).await {
        Ok(plates) => plates,
        Err(e) => {
            tracing::warn!(vehicle_id, error = %e, "Plate history lookup failed");
            Vec::new()
        }
    };

    let user = match &registration_form {
        Some(form) => match lookups.user_by_client_id(&form.lto_client_id).await {
            Ok(user) => {
                if user.is_none() {
                    tracing::debug!(lto_client_id = %form.lto_client_id, "No user for registration form owner");
                }
                user
            }
            Err(e) => {
                tracing::warn!(lto_client_id = %form.lto_client_id, error = %e, "Owner lookup failed");
                None
            }
        },
        None => None,
    };

    DetailPack {
        registration_form,
        plates,
        user,
    }
}
