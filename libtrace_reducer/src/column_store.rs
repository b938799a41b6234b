use hdf5::types::{TypeDescriptor, VarLenUnicode};
use hdf5::File;
use std::path::Path;
use std::str::FromStr;

use super::error::ColumnStoreError;
use super::feature_table::{Column, FeatureTable};

const DATA_NAME: &str = "data";
const VERSION_NAME: &str = "version";
const N_TRIGGERS_NAME: &str = "n_triggers";

/// This is the version of the output format
const FORMAT_VERSION: &str = "1.0";

// Structure
// data - version, n_triggers
// |---- <column name>(dset) one entry per trigger, i64 or f64

/// Persists FeatureTables to disk as HDF5 and reads them back.
///
/// A store is written in one shot and never appended to; persisting over an existing
/// store replaces it.
#[derive(Debug)]
pub struct ColumnStore;

impl ColumnStore {
    /// Write the table to path, overwriting any existing store.
    ///
    /// Every column must have the same length; a misaligned table is rejected before the
    /// file is touched.
    pub fn persist(path: &Path, table: &FeatureTable) -> Result<(), ColumnStoreError> {
        if let Some((column, found)) = table.find_short_column() {
            return Err(ColumnStoreError::MisalignedTable {
                column: column.clone(),
                found,
                expected: table.n_rows(),
            });
        }
        let file_handle = File::create(path)?;
        let n_triggers = table.n_rows() as u64;
        let store_version = format!("{}:{}", env!("CARGO_PKG_NAME"), FORMAT_VERSION);

        let data_group = file_handle.create_group(DATA_NAME)?;
        data_group
            .new_attr::<VarLenUnicode>()
            .create(VERSION_NAME)?
            .write_scalar(&VarLenUnicode::from_str(&store_version)?)?;
        data_group
            .new_attr::<u64>()
            .create(N_TRIGGERS_NAME)?
            .write_scalar(&n_triggers)?;

        for (name, column) in table.iter() {
            let builder = data_group.new_dataset_builder();
            match column {
                Column::Integer(values) => builder.with_data(values.as_slice()).create(name.as_str())?,
                Column::Float(values) => builder.with_data(values.as_slice()).create(name.as_str())?,
            };
        }
        file_handle.flush()?;
        drop(file_handle);

        let size = std::fs::metadata(path)?.len();
        log::info!(
            "Wrote {} columns of {} triggers to {:?} ({})",
            table.n_columns(),
            n_triggers,
            path,
            human_bytes::human_bytes(size as f64)
        );
        Ok(())
    }

    /// Read a table back from a store written by `persist`
    pub fn load(path: &Path) -> Result<FeatureTable, ColumnStoreError> {
        if !path.exists() {
            return Err(ColumnStoreError::BadFilePath(path.to_path_buf()));
        }
        let file_handle = File::open(path)?;
        let data_group = file_handle.group(DATA_NAME)?;
        let version = data_group
            .attr(VERSION_NAME)?
            .read_scalar::<VarLenUnicode>()?;
        let n_triggers = data_group.attr(N_TRIGGERS_NAME)?.read_scalar::<u64>()? as usize;
        log::debug!("Opened column store {:?} with format {}", path, version);

        let mut table = FeatureTable::new();
        for name in data_group.member_names()? {
            let dataset = data_group.dataset(&name)?;
            let column = match dataset.dtype()?.to_descriptor()? {
                TypeDescriptor::Integer(_) | TypeDescriptor::Unsigned(_) => {
                    Column::Integer(dataset.read_raw::<i64>()?)
                }
                TypeDescriptor::Float(_) => Column::Float(dataset.read_raw::<f64>()?),
                _ => return Err(ColumnStoreError::UnsupportedType(name)),
            };
            if column.len() != n_triggers {
                return Err(ColumnStoreError::CorruptStore {
                    column: name,
                    found: column.len(),
                    expected: n_triggers,
                });
            }
            table.insert(&name, column);
        }
        Ok(table)
    }
}
