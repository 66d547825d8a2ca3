pub mod expense;
pub mod invoice;
pub mod product;
pub mod recurrence;

pub use expense::{Expense, ExpenseCategory, NewExpense};
pub use invoice::{Invoice, InvoiceStatus, LineItem, NewInvoice, NewLineItem};
pub use product::{NewProduct, Product};
pub use recurrence::{next_occurrence, Frequency};
