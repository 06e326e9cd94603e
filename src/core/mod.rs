// Submission pipeline and presentation
pub mod form;
pub mod modal;
pub mod submission;

pub use form::{AssetRequirements, FormField, FormPresenter, FormState, RenderedForm};
pub use modal::{DialogMode, DialogSession, ModalError, ModalLoader};
pub use submission::{
    CaptchaPolicy, FallbackContact, Pipeline, SubmissionError, SubmissionHandler, SubmissionInput, SubmissionPolicy,
    SubmissionReceipt,
};
