pub mod documents;

pub use documents::{CreateExpenseRequest, CreateInvoiceRequest, LineItemRequest};
