//! Row values as produced by a query cursor
//!
//! A [`RowValue`] holds the raw field data of one row, one nullable byte
//! sequence per projected column. Values are immutable once constructed and
//! cheap to clone, which lets fetch windows and update overlays share them.
//!
//! The deleted-row marker produced by [`RowValue::deleted_marker`] has the
//! same arity as a real row and is recognised by its deleted flag
//! ([`RowValue::is_deleted_marker`]), not by identity: all markers of one
//! arity compare equal, and none equals a real row, including a row where
//! every field is NULL.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;

/// Raw field data of a single row.
///
/// # Example
///
/// ```rust
/// use firebird_fetch::RowValue;
///
/// let row = RowValue::of([Some(&b"1"[..]), None]);
/// assert_eq!(row.len(), 2);
/// assert_eq!(row.field_data(0).map(|b| &b[..]), Some(&b"1"[..]));
/// assert!(row.field_data(1).is_none());
///
/// let marker = RowValue::deleted_marker(2);
/// assert_ne!(marker, RowValue::of([None::<&[u8]>, None]));
/// ```
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct RowValue {
    fields: Arc<[Option<Bytes>]>,
    deleted: bool,
}

impl RowValue {
    /// Create a row from its field data
    pub fn new(fields: Vec<Option<Bytes>>) -> Self {
        Self {
            fields: fields.into(),
            deleted: false,
        }
    }

    /// Create a row from anything convertible to field bytes
    pub fn of<I, B>(fields: I) -> Self
    where
        I: IntoIterator<Item = Option<B>>,
        B: AsRef<[u8]>,
    {
        Self::new(
            fields
                .into_iter()
                .map(|field| field.map(|data| Bytes::copy_from_slice(data.as_ref())))
                .collect(),
        )
    }

    /// Row with zero fields
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Create the deleted-row marker for rows with `count` fields
    pub fn deleted_marker(count: usize) -> Self {
        Self {
            fields: vec![None; count].into(),
            deleted: true,
        }
    }

    /// Whether this value is a deleted-row marker
    pub fn is_deleted_marker(&self) -> bool {
        self.deleted
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check if the row has no fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Field data at `index`, `None` for NULL or an out of range index
    pub fn field_data(&self, index: usize) -> Option<&Bytes> {
        self.fields.get(index).and_then(Option::as_ref)
    }

    /// All fields of the row
    pub fn fields(&self) -> &[Option<Bytes>] {
        &self.fields
    }

    /// Copy of this row with one field replaced
    ///
    /// Returns `None` if `index` is out of range.
    pub fn with_field(&self, index: usize, data: Option<Bytes>) -> Option<Self> {
        if index >= self.fields.len() {
            return None;
        }
        let mut fields = self.fields.to_vec();
        fields[index] = data;
        Some(Self::new(fields))
    }
}

impl fmt::Debug for RowValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.deleted {
            return write!(f, "RowValue(<deleted>; {})", self.fields.len());
        }
        f.debug_list()
            .entries(self.fields.iter().map(|field| field.as_ref().map(|data| &data[..])))
            .finish()
    }
}

impl From<Vec<Option<Bytes>>> for RowValue {
    fn from(fields: Vec<Option<Bytes>>) -> Self {
        Self::new(fields)
    }
}
