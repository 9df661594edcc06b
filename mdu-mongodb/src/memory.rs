//! In-process [`Driver`] for tests and embedded use.
//!
//! Documents live in insertion order behind a lock. Filters support plain
//! equality (including dotted paths and array membership) plus `$eq`, `$ne`,
//! `$gt`, `$gte`, `$lt`, `$lte`, `$in`, `$nin`, `$exists`, `$and`, `$or` and
//! `$nor`. Updates support `$set` and `$unset`. Pipelines support `$match`,
//! `$skip`, `$limit`, `$sample`, `$unwind` and `$replaceRoot`. Anything else
//! is rejected with a persistence error rather than silently ignored.

use std::cmp::Ordering;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

use async_trait::async_trait;
use bson::{Bson, Document, oid::ObjectId};
use futures::stream::{self, StreamExt};
use parking_lot::{Mutex, RwLock};
use rand::seq::SliceRandom;

use crate::driver::{DeleteOutcome, DocumentStream, Driver, UpdateOutcome};
use crate::error::{MduError, MduResult};

/// A collection held in memory.
///
/// Clones share the same documents.
#[derive(Debug, Clone, Default)]
pub struct MemoryDriver {
    name: String,
    documents: Arc<RwLock<Vec<Document>>>,
    calls: Arc<AtomicU64>,
    failure: Arc<Mutex<Option<String>>>,
}

impl MemoryDriver {
    /// Create an empty collection.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Number of driver calls issued so far.
    pub fn calls(&self) -> u64 {
        self.calls.load(AtomicOrdering::SeqCst)
    }

    /// Snapshot of the stored documents.
    pub fn documents(&self) -> Vec<Document> {
        self.documents.read().clone()
    }

    /// Number of stored documents.
    pub fn len(&self) -> usize {
        self.documents.read().len()
    }

    /// Whether the collection is empty.
    pub fn is_empty(&self) -> bool {
        self.documents.read().is_empty()
    }

    /// Make every subsequent call fail with `message` until cleared with `None`.
    pub fn set_failure(&self, message: Option<&str>) {
        *self.failure.lock() = message.map(str::to_string);
    }

    fn enter(&self) -> MduResult<()> {
        self.calls.fetch_add(1, AtomicOrdering::SeqCst);
        match self.failure.lock().as_ref() {
            Some(message) => Err(MduError::persistence(message.clone())),
            None => Ok(()),
        }
    }

    fn select(&self, filter: &Document) -> MduResult<Vec<Document>> {
        let documents = self.documents.read();
        let mut selected = Vec::new();
        for doc in documents.iter() {
            if matches(doc, filter)? {
                selected.push(doc.clone());
            }
        }
        Ok(selected)
    }
}

#[async_trait]
impl Driver for MemoryDriver {
    fn namespace(&self) -> &str {
        &self.name
    }

    async fn insert_one(&self, mut document: Document) -> MduResult<Bson> {
        self.enter()?;
        let id = match document.get("_id") {
            Some(id) if *id != Bson::Null => id.clone(),
            _ => {
                let id = Bson::ObjectId(ObjectId::new());
                document.insert("_id", id.clone());
                id
            }
        };

        let mut documents = self.documents.write();
        if documents.iter().any(|doc| doc.get("_id") == Some(&id)) {
            return Err(MduError::persistence(format!(
                "duplicate key error collection: {} dup key: {{ _id: {} }}",
                self.name, id
            )));
        }
        documents.push(document);
        Ok(id)
    }

    async fn find_one(&self, filter: Document) -> MduResult<Option<Document>> {
        self.enter()?;
        let documents = self.documents.read();
        for doc in documents.iter() {
            if matches(doc, &filter)? {
                return Ok(Some(doc.clone()));
            }
        }
        Ok(None)
    }

    async fn update_one(&self, filter: Document, update: Document) -> MduResult<UpdateOutcome> {
        self.enter()?;
        let mut documents = self.documents.write();
        let mut position = None;
        for (index, doc) in documents.iter().enumerate() {
            if matches(doc, &filter)? {
                position = Some(index);
                break;
            }
        }

        let Some(index) = position else {
            return Ok(UpdateOutcome::default());
        };

        let mut updated = documents[index].clone();
        apply_update(&mut updated, &update)?;
        let modified = updated != documents[index];
        documents[index] = updated;

        Ok(UpdateOutcome {
            matched_count: 1,
            modified_count: u64::from(modified),
        })
    }

    async fn delete_one(&self, filter: Document) -> MduResult<DeleteOutcome> {
        self.enter()?;
        let mut documents = self.documents.write();
        let mut position = None;
        for (index, doc) in documents.iter().enumerate() {
            if matches(doc, &filter)? {
                position = Some(index);
                break;
            }
        }

        match position {
            Some(index) => {
                documents.remove(index);
                Ok(DeleteOutcome { deleted_count: 1 })
            }
            None => Ok(DeleteOutcome::default()),
        }
    }

    async fn find(&self, filter: Document) -> MduResult<DocumentStream> {
        self.enter()?;
        let selected = self.select(&filter)?;
        Ok(stream::iter(selected.into_iter().map(Ok)).boxed())
    }

    async fn aggregate(&self, pipeline: Vec<Document>) -> MduResult<DocumentStream> {
        self.enter()?;
        let documents = self.documents();
        let output = run_pipeline(documents, &pipeline)?;
        Ok(stream::iter(output.into_iter().map(Ok)).boxed())
    }
}

fn unsupported(what: &str) -> MduError {
    MduError::persistence(format!("memory driver does not support {what}"))
}

/// Resolve a dotted path inside a document.
fn lookup<'a>(doc: &'a Document, path: &str) -> Option<&'a Bson> {
    let mut parts = path.split('.');
    let mut current = doc.get(parts.next()?)?;
    for part in parts {
        current = current.as_document()?.get(part)?;
    }
    Some(current)
}

/// Set a dotted path, creating intermediate documents.
fn set_path(doc: &mut Document, path: &str, value: Bson) {
    match path.split_once('.') {
        None => {
            doc.insert(path, value);
        }
        Some((head, rest)) => {
            if !matches!(doc.get(head), Some(Bson::Document(_))) {
                doc.insert(head, Document::new());
            }
            if let Some(Bson::Document(child)) = doc.get_mut(head) {
                set_path(child, rest, value);
            }
        }
    }
}

fn unset_path(doc: &mut Document, path: &str) {
    match path.split_once('.') {
        None => {
            doc.remove(path);
        }
        Some((head, rest)) => {
            if let Some(Bson::Document(child)) = doc.get_mut(head) {
                unset_path(child, rest);
            }
        }
    }
}

fn apply_update(doc: &mut Document, update: &Document) -> MduResult<()> {
    if update.is_empty() {
        return Err(MduError::persistence("update document must not be empty"));
    }
    for (operator, fields) in update {
        let fields = fields
            .as_document()
            .ok_or_else(|| MduError::persistence(format!("{operator} expects a document")))?;
        match operator.as_str() {
            "$set" => {
                for (path, value) in fields {
                    if path == "_id" && doc.get("_id") != Some(value) {
                        return Err(MduError::persistence(
                            "performing an update on the path '_id' would modify the immutable field '_id'",
                        ));
                    }
                    set_path(doc, path, value.clone());
                }
            }
            "$unset" => {
                for (path, _) in fields {
                    unset_path(doc, path);
                }
            }
            other if other.starts_with('$') => return Err(unsupported(other)),
            _ => {
                return Err(MduError::persistence(
                    "update document requires atomic operators",
                ));
            }
        }
    }
    Ok(())
}

fn as_f64(value: &Bson) -> Option<f64> {
    match value {
        Bson::Int32(n) => Some(f64::from(*n)),
        Bson::Int64(n) => Some(*n as f64),
        Bson::Double(n) => Some(*n),
        _ => None,
    }
}

fn as_i64(value: &Bson) -> Option<i64> {
    match value {
        Bson::Int32(n) => Some(i64::from(*n)),
        Bson::Int64(n) => Some(*n),
        Bson::Double(n) if n.fract() == 0.0 => Some(*n as i64),
        _ => None,
    }
}

fn compare(a: &Bson, b: &Bson) -> Option<Ordering> {
    if let (Some(x), Some(y)) = (as_f64(a), as_f64(b)) {
        return x.partial_cmp(&y);
    }
    match (a, b) {
        (Bson::String(x), Bson::String(y)) => Some(x.cmp(y)),
        (Bson::Boolean(x), Bson::Boolean(y)) => Some(x.cmp(y)),
        (Bson::DateTime(x), Bson::DateTime(y)) => Some(x.cmp(y)),
        (Bson::ObjectId(x), Bson::ObjectId(y)) => Some(x.bytes().cmp(&y.bytes())),
        _ if a == b => Some(Ordering::Equal),
        _ => None,
    }
}

fn equals(value: Option<&Bson>, expected: &Bson) -> bool {
    match value {
        None => *expected == Bson::Null,
        Some(Bson::Array(items)) if !matches!(expected, Bson::Array(_)) => items
            .iter()
            .any(|item| compare(item, expected) == Some(Ordering::Equal)),
        Some(actual) => compare(actual, expected) == Some(Ordering::Equal),
    }
}

fn ordered(value: Option<&Bson>, operand: &Bson, accept: fn(Ordering) -> bool) -> bool {
    value
        .and_then(|actual| compare(actual, operand))
        .is_some_and(accept)
}

fn operand_array<'a>(operator: &str, operand: &'a Bson) -> MduResult<&'a Vec<Bson>> {
    operand
        .as_array()
        .ok_or_else(|| MduError::persistence(format!("{operator} needs an array")))
}

fn is_operator_document(condition: &Bson) -> bool {
    condition
        .as_document()
        .and_then(|doc| doc.keys().next())
        .is_some_and(|key| key.starts_with('$'))
}

fn matches_condition(value: Option<&Bson>, condition: &Bson) -> MduResult<bool> {
    if !is_operator_document(condition) {
        return Ok(equals(value, condition));
    }

    let Some(operators) = condition.as_document() else {
        return Ok(false);
    };
    for (operator, operand) in operators {
        let ok = match operator.as_str() {
            "$eq" => equals(value, operand),
            "$ne" => !equals(value, operand),
            "$gt" => ordered(value, operand, Ordering::is_gt),
            "$gte" => ordered(value, operand, Ordering::is_ge),
            "$lt" => ordered(value, operand, Ordering::is_lt),
            "$lte" => ordered(value, operand, Ordering::is_le),
            "$in" => operand_array("$in", operand)?
                .iter()
                .any(|candidate| equals(value, candidate)),
            "$nin" => !operand_array("$nin", operand)?
                .iter()
                .any(|candidate| equals(value, candidate)),
            "$exists" => value.is_some() == truthy(operand),
            other => return Err(unsupported(other)),
        };
        if !ok {
            return Ok(false);
        }
    }
    Ok(true)
}

fn truthy(value: &Bson) -> bool {
    match value {
        Bson::Boolean(b) => *b,
        Bson::Null => false,
        other => as_f64(other).is_none_or(|n| n != 0.0),
    }
}

fn sub_filters<'a>(operator: &str, value: &'a Bson) -> MduResult<Vec<&'a Document>> {
    operand_array(operator, value)?
        .iter()
        .map(|item| {
            item.as_document()
                .ok_or_else(|| MduError::persistence(format!("{operator} entries must be documents")))
        })
        .collect()
}

fn matches(doc: &Document, filter: &Document) -> MduResult<bool> {
    for (key, condition) in filter {
        let ok = match key.as_str() {
            "$and" => {
                let mut all = true;
                for sub in sub_filters("$and", condition)? {
                    if !matches(doc, sub)? {
                        all = false;
                        break;
                    }
                }
                all
            }
            "$or" | "$nor" => {
                let mut any = false;
                for sub in sub_filters(key, condition)? {
                    if matches(doc, sub)? {
                        any = true;
                        break;
                    }
                }
                if key == "$or" { any } else { !any }
            }
            other if other.starts_with('$') => return Err(unsupported(other)),
            path => matches_condition(lookup(doc, path), condition)?,
        };
        if !ok {
            return Ok(false);
        }
    }
    Ok(true)
}

fn field_path(value: &Bson) -> MduResult<&str> {
    value
        .as_str()
        .and_then(|s| s.strip_prefix('$'))
        .ok_or_else(|| MduError::persistence(format!("expected a field path, got {value}")))
}

fn unwind(documents: Vec<Document>, body: &Bson) -> MduResult<Vec<Document>> {
    let (path, index_field, preserve) = match body {
        Bson::String(_) => (field_path(body)?, None, false),
        Bson::Document(options) => {
            let path = options
                .get("path")
                .ok_or_else(|| MduError::persistence("$unwind requires a path"))?;
            let index_field = options.get_str("includeArrayIndex").ok();
            let preserve = options
                .get_bool("preserveNullAndEmptyArrays")
                .unwrap_or(false);
            (field_path(path)?, index_field, preserve)
        }
        _ => return Err(MduError::persistence("invalid $unwind specification")),
    };

    let mut output = Vec::new();
    for doc in documents {
        match lookup(&doc, path).cloned() {
            Some(Bson::Array(items)) if !items.is_empty() => {
                for (index, item) in items.into_iter().enumerate() {
                    let mut copy = doc.clone();
                    set_path(&mut copy, path, item);
                    if let Some(field) = index_field {
                        set_path(&mut copy, field, Bson::Int64(index as i64));
                    }
                    output.push(copy);
                }
            }
            Some(Bson::Array(_)) | Some(Bson::Null) | None => {
                if preserve {
                    let mut copy = doc;
                    if let Some(field) = index_field {
                        set_path(&mut copy, field, Bson::Null);
                    }
                    output.push(copy);
                }
            }
            Some(_) => {
                let mut copy = doc;
                if let Some(field) = index_field {
                    set_path(&mut copy, field, Bson::Null);
                }
                output.push(copy);
            }
        }
    }
    Ok(output)
}

fn replace_root(documents: Vec<Document>, body: &Bson) -> MduResult<Vec<Document>> {
    let new_root = body
        .as_document()
        .and_then(|spec| spec.get("newRoot"))
        .ok_or_else(|| MduError::persistence("$replaceRoot requires newRoot"))?;

    documents
        .into_iter()
        .map(|doc| match new_root {
            Bson::Document(literal) => Ok(literal.clone()),
            expr => match lookup(&doc, field_path(expr)?) {
                Some(Bson::Document(root)) => Ok(root.clone()),
                _ => Err(MduError::persistence(
                    "'newRoot' expression must evaluate to an object",
                )),
            },
        })
        .collect()
}

fn count_operand(stage: &str, body: &Bson) -> MduResult<usize> {
    as_i64(body)
        .filter(|n| *n >= 0)
        .map(|n| n as usize)
        .ok_or_else(|| MduError::persistence(format!("{stage} expects a non-negative integer")))
}

fn run_pipeline(mut documents: Vec<Document>, pipeline: &[Document]) -> MduResult<Vec<Document>> {
    for stage in pipeline {
        let mut entries = stage.iter();
        let (Some((operator, body)), None) = (entries.next(), entries.next()) else {
            return Err(MduError::persistence(
                "a pipeline stage specification must contain exactly one field",
            ));
        };

        documents = match operator.as_str() {
            "$match" => {
                let filter = body
                    .as_document()
                    .ok_or_else(|| MduError::persistence("$match expects a document"))?;
                let mut kept = Vec::new();
                for doc in documents {
                    if matches(&doc, filter)? {
                        kept.push(doc);
                    }
                }
                kept
            }
            "$skip" => {
                let n = count_operand("$skip", body)?;
                documents.into_iter().skip(n).collect()
            }
            "$limit" => {
                let n = count_operand("$limit", body)?;
                documents.into_iter().take(n).collect()
            }
            "$sample" => {
                let size = body
                    .as_document()
                    .and_then(|spec| spec.get("size"))
                    .ok_or_else(|| MduError::persistence("$sample requires a size"))?;
                let size = count_operand("$sample", size)?;
                documents.shuffle(&mut rand::thread_rng());
                documents.truncate(size);
                documents
            }
            "$unwind" => unwind(documents, body)?,
            "$replaceRoot" => replace_root(documents, body)?,
            other => return Err(unsupported(other)),
        };
    }
    Ok(documents)
}
