pub mod executor;
pub mod postgres;
pub mod result;

pub use executor::SqlExecutor;
pub use postgres::PgExecutor;
pub use result::{QueryResult, RawResultSet, Row, DISPLAY_ROW_LIMIT};
