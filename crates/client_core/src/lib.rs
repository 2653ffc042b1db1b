pub mod controller;
pub mod error;
pub mod form;
pub mod gateway;

pub use controller::{ControllerState, ReservationController, Visibility};
pub use error::{CreateReservationError, GatewayError, GatewayResult};
pub use form::{FormError, ReservationForm, SubmitError};
pub use gateway::{GatewayOptions, HttpReservationGateway, ReservationGateway};
