//! Zone maps: per-zone statistics stored next to a column, used to skip row ranges that cannot
//! match a predicate before any of their values are fetched.

use futures::future::{BoxFuture, Shared};
pub use predicate::*;
use strata_error::SharedStrataResult;
pub use zone_map::*;

mod predicate;
mod reader;
mod zone_map;

pub(crate) type SharedZoneMap = Shared<BoxFuture<'static, SharedStrataResult<ZoneMap>>>;
