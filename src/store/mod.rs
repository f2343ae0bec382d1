
use std::path::PathBuf;
use std::sync::Arc;

use arrow::array::{Array, FixedSizeListArray, Float32Array, RecordBatchIterator, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use futures::TryStreamExt;
use lancedb::database::CreateTableMode;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{Connection, Table};
use serde::Serialize;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::{RetrievalError, Result};

/// A persisted chunk row: embedding vector plus text and source provenance
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkRow {
    pub vector: Vec<f32>,
    pub text: String,
    pub source: String,
}

/// Result of a nearest-neighbor query. `score` is a distance, lower is
/// more similar.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub text: String,
    pub source: String,
    pub score: f32,
}

/// Vector index over chunk embeddings, backed by LanceDB.
///
/// Construction is cheap; the connection is established once on first use
/// and shared by every subsequent call. The store exclusively owns the
/// on-disk table: one live generation exists at a time, and a bulk
/// [`create_table`](Self::create_table) replaces the previous generation
/// atomically from the reader's point of view.
pub struct VectorStore {
    db_path: PathBuf,
    table_name: String,
    connection: OnceCell<Connection>,
}

impl VectorStore {
    #[inline]
    pub fn new(db_path: PathBuf, table_name: impl Into<String>) -> Self {
        Self {
            db_path,
            table_name: table_name.into(),
            connection: OnceCell::new(),
        }
    }

    #[inline]
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    async fn connection(&self) -> Result<&Connection> {
        self.connection.get_or_try_init(|| self.connect()).await
    }

    async fn connect(&self) -> Result<Connection> {
        debug!("Initializing LanceDB at path: {:?}", self.db_path);

        std::fs::create_dir_all(&self.db_path).map_err(|e| {
            RetrievalError::Storage(format!(
                "failed to create vector database directory {}: {}",
                self.db_path.display(),
                e
            ))
        })?;

        let uri = format!("file://{}", self.db_path.display());
        let connection = lancedb::connect(&uri)
            .execute()
            .await
            .map_err(|e| RetrievalError::Storage(format!("failed to connect to LanceDB: {}", e)))?;

        info!("Vector store connected at {}", self.db_path.display());
        Ok(connection)
    }

    /// Enumerate existing tables
    #[inline]
    pub async fn table_names(&self) -> Result<Vec<String>> {
        self.connection()
            .await?
            .table_names()
            .execute()
            .await
            .map_err(|e| RetrievalError::Storage(format!("failed to list tables: {}", e)))
    }

    /// Whether the index table for this collection already exists
    #[inline]
    pub async fn table_exists(&self) -> Result<bool> {
        Ok(self.table_names().await?.contains(&self.table_name))
    }

    /// Create the index table from a bulk set of rows, replacing any
    /// previous generation.
    ///
    /// The write goes through LanceDB's overwrite mode, which commits the
    /// new table before repointing the name, so a concurrent reader never
    /// observes a partially written or absent table.
    #[inline]
    pub async fn create_table(&self, rows: Vec<ChunkRow>) -> Result<()> {
        let Some(first) = rows.first() else {
            return Err(RetrievalError::Storage(
                "refusing to create an index table with no rows".to_string(),
            ));
        };
        let dimension = first.vector.len();
        if dimension == 0 {
            return Err(RetrievalError::Storage(
                "refusing to create an index table with zero-dimensional vectors".to_string(),
            ));
        }
        if let Some(row) = rows.iter().find(|row| row.vector.len() != dimension) {
            return Err(RetrievalError::Storage(format!(
                "inconsistent vector dimensions in bulk write: expected {}, found {} (source {})",
                dimension,
                row.vector.len(),
                row.source
            )));
        }

        debug!(
            "Writing {} rows to table '{}' ({} dimensions)",
            rows.len(),
            self.table_name,
            dimension
        );

        let row_count = rows.len();
        let batch = create_record_batch(&rows, dimension)?;
        let schema = batch.schema();
        let reader = RecordBatchIterator::new(std::iter::once(Ok(batch)), schema);

        self.connection()
            .await?
            .create_table(&self.table_name, reader)
            .mode(CreateTableMode::Overwrite)
            .execute()
            .await
            .map_err(|e| {
                RetrievalError::Storage(format!(
                    "failed to create table '{}': {}",
                    self.table_name, e
                ))
            })?;

        info!(
            "Created table '{}' with {} rows",
            self.table_name, row_count
        );
        Ok(())
    }

    /// Drop the index table. Returns `false` when the table did not exist,
    /// which is the expected steady state before the first ingestion; any
    /// other failure propagates.
    #[inline]
    pub async fn drop_table(&self) -> Result<bool> {
        match self.connection().await?.drop_table(&self.table_name).await {
            Ok(()) => {
                info!("Dropped table '{}'", self.table_name);
                Ok(true)
            }
            Err(lancedb::Error::TableNotFound { .. }) => {
                debug!("Table '{}' does not exist, nothing to drop", self.table_name);
                Ok(false)
            }
            Err(e) => Err(RetrievalError::Storage(format!(
                "failed to drop table '{}': {}",
                self.table_name, e
            ))),
        }
    }

    /// Nearest-neighbor search, ordered by ascending distance.
    #[inline]
    pub async fn search(&self, query_vector: &[f32], limit: usize) -> Result<Vec<SearchResult>> {
        debug!(
            "Searching table '{}' with limit {}",
            self.table_name, limit
        );

        let table = self.open_table().await?;

        let stored_dimension = table_dimension(&table).await?;
        if query_vector.len() != stored_dimension {
            return Err(RetrievalError::Storage(format!(
                "query vector has {} dimensions but table '{}' stores {}-dimensional vectors",
                query_vector.len(),
                self.table_name,
                stored_dimension
            )));
        }

        let mut stream = table
            .vector_search(query_vector)
            .map_err(|e| RetrievalError::Storage(format!("failed to build vector search: {}", e)))?
            .column("vector")
            .limit(limit)
            .execute()
            .await
            .map_err(|e| RetrievalError::Storage(format!("failed to execute search: {}", e)))?;

        let mut results = Vec::new();
        while let Some(batch) = stream
            .try_next()
            .await
            .map_err(|e| RetrievalError::Storage(format!("failed to read result stream: {}", e)))?
        {
            results.extend(parse_search_batch(&batch)?);
        }

        debug!("Search returned {} results", results.len());
        Ok(results)
    }

    /// Number of rows in the current index generation
    #[inline]
    pub async fn count_rows(&self) -> Result<usize> {
        let table = self.open_table().await?;
        table
            .count_rows(None)
            .await
            .map_err(|e| RetrievalError::Storage(format!("failed to count rows: {}", e)))
    }

    async fn open_table(&self) -> Result<Table> {
        match self
            .connection()
            .await?
            .open_table(&self.table_name)
            .execute()
            .await
        {
            Ok(table) => Ok(table),
            Err(lancedb::Error::TableNotFound { .. }) => {
                Err(RetrievalError::TableMissing(self.table_name.clone()))
            }
            Err(e) => Err(RetrievalError::Storage(format!(
                "failed to open table '{}': {}",
                self.table_name, e
            ))),
        }
    }
}

fn create_schema(dimension: usize) -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new(
            "vector",
            DataType::FixedSizeList(
                Arc::new(Field::new("item", DataType::Float32, false)),
                dimension as i32,
            ),
            false,
        ),
        Field::new("text", DataType::Utf8, false),
        Field::new("source", DataType::Utf8, false),
    ]))
}

fn create_record_batch(rows: &[ChunkRow], dimension: usize) -> Result<RecordBatch> {
    let mut flat_values = Vec::with_capacity(rows.len() * dimension);
    let mut texts = Vec::with_capacity(rows.len());
    let mut sources = Vec::with_capacity(rows.len());

    for row in rows {
        flat_values.extend_from_slice(&row.vector);
        texts.push(row.text.as_str());
        sources.push(row.source.as_str());
    }

    let item_field = Arc::new(Field::new("item", DataType::Float32, false));
    let vector_array = FixedSizeListArray::try_new(
        item_field,
        dimension as i32,
        Arc::new(Float32Array::from(flat_values)),
        None,
    )
    .map_err(|e| RetrievalError::Storage(format!("failed to create vector array: {}", e)))?;

    let arrays: Vec<Arc<dyn Array>> = vec![
        Arc::new(vector_array),
        Arc::new(StringArray::from(texts)),
        Arc::new(StringArray::from(sources)),
    ];

    RecordBatch::try_new(create_schema(dimension), arrays)
        .map_err(|e| RetrievalError::Storage(format!("failed to create record batch: {}", e)))
}

/// Read the vector width out of an existing table's schema
async fn table_dimension(table: &Table) -> Result<usize> {
    let schema = table
        .schema()
        .await
        .map_err(|e| RetrievalError::Storage(format!("failed to read table schema: {}", e)))?;

    for field in schema.fields() {
        if field.name() == "vector" {
            if let DataType::FixedSizeList(_, size) = field.data_type() {
                return Ok(*size as usize);
            }
        }
    }

    Err(RetrievalError::Storage(
        "could not find vector column or determine its dimension".to_string(),
    ))
}

fn parse_search_batch(batch: &RecordBatch) -> Result<Vec<SearchResult>> {
    let texts = string_column(batch, "text")?;
    let sources = string_column(batch, "source")?;

    let distances = batch
        .column_by_name("_distance")
        .map(|col| col.as_any().downcast_ref::<Float32Array>());

    let mut results = Vec::with_capacity(batch.num_rows());
    for row in 0..batch.num_rows() {
        let score = distances
            .flatten()
            .map_or(0.0, |d| if d.is_null(row) { 0.0 } else { d.value(row) });

        results.push(SearchResult {
            text: texts.value(row).to_string(),
            source: sources.value(row).to_string(),
            score,
        });
    }

    Ok(results)
}

fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
    batch
        .column_by_name(name)
        .ok_or_else(|| RetrievalError::Storage(format!("missing {} column", name)))?
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| RetrievalError::Storage(format!("invalid {} column type", name)))
}
