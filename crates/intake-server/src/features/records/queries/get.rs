use crate::store::{Store, StoreResult};
use intake_common::{Record, Token};

#[derive(Debug, Clone)]
pub struct GetRecordQuery {
    pub token: Token,
}

#[tracing::instrument(skip(store, query), fields(token = %query.token))]
pub async fn handle(store: Store, query: GetRecordQuery) -> StoreResult<Record> {
    store.get(&query.token).await
}
