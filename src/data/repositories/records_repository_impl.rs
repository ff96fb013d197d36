use fractic_server_error::ServerError;

use crate::data::datasources::accounts_csv::{AccountsCsvDatasource, AccountsCsvDatasourceImpl};
use crate::data::datasources::credit_notes_csv::{
    CreditNotesCsvDatasource, CreditNotesCsvDatasourceImpl,
};
use crate::data::datasources::customers_csv::{CustomersCsvDatasource, CustomersCsvDatasourceImpl};
use crate::data::datasources::invoices_csv::{InvoicesCsvDatasource, InvoicesCsvDatasourceImpl};
use crate::data::datasources::payments_csv::{PaymentsCsvDatasource, PaymentsCsvDatasourceImpl};
use crate::data::datasources::subscriptions_csv::{
    SubscriptionsCsvDatasource, SubscriptionsCsvDatasourceImpl,
};
use crate::domain::entities::InputTables;
use crate::domain::repositories::records_repository::{RawCsvInputs, RecordsRepository};

pub(crate) struct RecordsRepositoryImpl {
    accounts: AccountsCsvDatasourceImpl,
    customers: CustomersCsvDatasourceImpl,
    subscriptions: SubscriptionsCsvDatasourceImpl,
    invoices: InvoicesCsvDatasourceImpl,
    payments: PaymentsCsvDatasourceImpl,
    credit_notes: CreditNotesCsvDatasourceImpl,
}

impl RecordsRepositoryImpl {
    pub(crate) fn new() -> Self {
        Self {
            accounts: AccountsCsvDatasourceImpl,
            customers: CustomersCsvDatasourceImpl,
            subscriptions: SubscriptionsCsvDatasourceImpl,
            invoices: InvoicesCsvDatasourceImpl,
            payments: PaymentsCsvDatasourceImpl,
            credit_notes: CreditNotesCsvDatasourceImpl,
        }
    }
}

impl RecordsRepository for RecordsRepositoryImpl {
    fn from_strings(&self, inputs: RawCsvInputs<'_>) -> Result<InputTables, ServerError> {
        Ok(InputTables {
            accounts: self.accounts.from_string(inputs.accounts_csv)?,
            customers: self.customers.from_string(inputs.customers_csv)?,
            subscriptions: self.subscriptions.from_string(inputs.subscriptions_csv)?,
            invoices: self.invoices.from_string(inputs.invoices_csv)?,
            payments: self.payments.from_string(inputs.payments_csv)?,
            credit_notes: self.credit_notes.from_string(inputs.credit_notes_csv)?,
        })
    }
}
