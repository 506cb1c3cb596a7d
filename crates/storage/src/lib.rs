pub mod access;
pub mod assemble;
pub mod decode;
pub mod error;
pub mod executor;
pub mod pager;
pub mod session;
pub mod sort;

pub use access::{check_access, filter_allowed};
pub use assemble::{
    assemble_count, assemble_search, AggregateRow, CountCell, CountCellValue, CountResult, Header,
    HitResponse, ResourceHits, SearchResult,
};
pub use decode::{decode_entry_data, split_collection, CellValue, ExplodedCell};
pub use error::{KarpsError, Result};
pub use executor::{fetch_all, fetch_count, QueryRows};
pub use pager::{plan_pagination, ResourceWindow};
pub use session::create_pool;
