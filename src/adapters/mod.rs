// Adapters layer: concrete implementations of the ports (Canvas REST, CSV, Google Sheets).

pub mod canvas;
pub mod csv_source;
pub mod google_auth;
pub mod sheets_source;

pub use canvas::CanvasClient;
pub use csv_source::CsvRequestSource;
pub use google_auth::GoogleAuthorizer;
pub use sheets_source::SheetsRequestSource;
