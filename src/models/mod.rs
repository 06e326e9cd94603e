// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{ChangeRequest, CustomerId, PageInfo, RequestFieldValues, SelectValue, TicketIssue, UNKNOWN_SCORE};
pub use requests::{FormSubmission, LoadFormQuery, SubmitRequest};
pub use responses::{ApiErrorResponse, ConfirmationResponse, ErrorResponse, HealthResponse, LoadFormResponse, ModalResponse, SubmitResponse};
