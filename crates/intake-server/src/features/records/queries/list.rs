//! Overview listing for administrators

use crate::store::{Store, StoreResult};
use intake_common::RecordOverview;

#[derive(Debug, Clone, Default)]
pub struct ListRecordsQuery;

/// All records reduced to their identity fields, most recently updated first.
#[tracing::instrument(skip(store, _query))]
pub async fn handle(store: Store, _query: ListRecordsQuery) -> StoreResult<Vec<RecordOverview>> {
    let overview = store.list_overview().await?;
    tracing::debug!(count = overview.len(), "Listed records");
    Ok(overview)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::schema::FieldChanges;
    use intake_common::{FieldValue, Token};

    #[tokio::test]
    async fn test_most_recently_updated_first() {
        let store = Store::in_memory();
        let older = store.create(&Token::from("a")).await.unwrap().token;
        let newer = store.create(&Token::from("b")).await.unwrap().token;

        let changes = FieldChanges::from([(
            "lastName".to_string(),
            Some(FieldValue::Text("Beridze".into())),
        )]);
        store.update(&older, &changes).await.unwrap();

        let overview = handle(store, ListRecordsQuery).await.unwrap();
        assert_eq!(overview.len(), 2);
        assert_eq!(overview[0].token, older);
        assert_eq!(overview[0].last_name.as_deref(), Some("Beridze"));
        assert_eq!(overview[1].token, newer);
    }

    #[tokio::test]
    async fn test_empty_store_lists_nothing() {
        let overview = handle(Store::in_memory(), ListRecordsQuery).await.unwrap();
        assert!(overview.is_empty());
    }
}
