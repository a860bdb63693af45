//! Indexing - Basic Views and Advanced Gathers
//!
//! Translates an index expression into either a new layout over the same
//! buffer (basic indexing: integers, slices, new axes) or a list of byte
//! addresses to gather into a fresh buffer (advanced indexing: boolean
//! masks and integer lists).
//!
//! Basic indexing never copies, so writing to its result writes to the
//! source. Advanced indexing always copies on read, so writing to its
//! result never touches the source. Assignment through an advanced index
//! scatters into the source buffer itself.
//!
//! # Key Features
//! - NumPy-style slice normalization with negative indices and steps
//! - Coordinated gather for several advanced items of equal length
//! - All-or-nothing assignment: every address is validated and every
//!   source value converted before the first byte is written
//!
//! @version 0.1.0
//! @author ndview contributors

use ndview_core::buffer::Buffer;
use ndview_core::dtype::Value;
use ndview_core::error::{Error, Result};

use crate::array::ArrayHandle;
use crate::layout::{Layout, OffsetIter, Order, Shape, Strides};

// =============================================================================
// Index Specification
// =============================================================================

/// One item of an index expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexSpec {
    /// Select a single position, removing the axis. Negative values wrap.
    Index(isize),
    /// Select `[start, stop)` with `step`; `None` bounds default by step sign.
    Range {
        /// Start index (inclusive), None = beginning
        start: Option<isize>,
        /// Stop index (exclusive), None = end
        stop: Option<isize>,
        /// Step size, non-zero
        step: isize,
    },
    /// Keep the whole axis.
    All,
    /// Insert a new axis of length 1.
    NewAxis,
    /// Expand to as many `All` items as needed.
    Ellipsis,
    /// Select positions where the mask is true (advanced).
    Mask(Vec<bool>),
    /// Select positions by index list (advanced). Negative values wrap.
    Take(Vec<isize>),
}

impl IndexSpec {
    /// True for mask and index-list items.
    #[must_use]
    pub fn is_advanced(&self) -> bool {
        matches!(self, Self::Mask(_) | Self::Take(_))
    }

    fn consumes_axis(&self) -> bool {
        !matches!(self, Self::NewAxis | Self::Ellipsis)
    }
}

impl From<isize> for IndexSpec {
    fn from(i: isize) -> Self {
        Self::Index(i)
    }
}

impl From<Vec<isize>> for IndexSpec {
    fn from(v: Vec<isize>) -> Self {
        Self::Take(v)
    }
}

impl From<Vec<bool>> for IndexSpec {
    fn from(v: Vec<bool>) -> Self {
        Self::Mask(v)
    }
}

/// Slice `start..stop` with `step`.
#[must_use]
pub fn s_range(start: isize, stop: isize, step: isize) -> IndexSpec {
    IndexSpec::Range {
        start: Some(start),
        stop: Some(stop),
        step,
    }
}

/// Slice `start..`.
#[must_use]
pub fn s_from(start: isize) -> IndexSpec {
    IndexSpec::Range {
        start: Some(start),
        stop: None,
        step: 1,
    }
}

/// Slice `..stop`.
#[must_use]
pub fn s_to(stop: isize) -> IndexSpec {
    IndexSpec::Range {
        start: None,
        stop: Some(stop),
        step: 1,
    }
}

/// Whole axis with `step`, e.g. `s_step(-1)` reverses.
#[must_use]
pub fn s_step(step: isize) -> IndexSpec {
    IndexSpec::Range {
        start: None,
        stop: None,
        step,
    }
}

/// Source of values for [`ArrayHandle::assign`].
#[derive(Debug)]
pub enum Assign<'a> {
    /// Broadcast one value to every target element.
    Scalar(Value),
    /// Element-wise values in C order; element count must match (or be 1).
    Array(&'a ArrayHandle),
}

// =============================================================================
// Resolution
// =============================================================================

/// Result of resolving an index expression.
#[derive(Debug, Clone)]
pub(crate) enum Selection {
    /// Basic indexing: a layout over the same buffer.
    View(Layout),
    /// Advanced indexing: element addresses in result C order.
    Gather { shape: Shape, addresses: Vec<usize> },
}

impl Selection {
    fn addresses(&self) -> Vec<usize> {
        match self {
            Self::View(layout) => layout.offsets().collect(),
            Self::Gather { addresses, .. } => addresses.clone(),
        }
    }

    fn shape(&self) -> &[usize] {
        match self {
            Self::View(layout) => layout.shape(),
            Self::Gather { shape, .. } => shape,
        }
    }
}

fn wrap_index(index: isize, size: usize) -> Result<usize> {
    let wrapped = if index < 0 {
        index + size as isize
    } else {
        index
    };
    if wrapped < 0 || wrapped >= size as isize {
        return Err(Error::IndexRange { index, size });
    }
    Ok(wrapped as usize)
}

/// Normalizes a slice against an axis of length `len`.
///
/// Returns the first selected position and the number of selected
/// positions.
fn slice_bounds(
    start: Option<isize>,
    stop: Option<isize>,
    step: isize,
    len: usize,
) -> Result<(isize, usize)> {
    if step == 0 {
        return Err(Error::index_shape("slice step cannot be zero"));
    }
    if step == isize::MIN {
        return Err(Error::index_shape("slice step out of range"));
    }
    let n = len as isize;

    let clamp = |value: isize, low: isize, high: isize| -> isize {
        let value = if value < 0 { value + n } else { value };
        value.clamp(low, high)
    };

    if step > 0 {
        let start = start.map_or(0, |s| clamp(s, 0, n));
        let stop = stop.map_or(n, |s| clamp(s, 0, n));
        let count = if stop > start {
            (stop - start - 1) / step + 1
        } else {
            0
        };
        Ok((start, count as usize))
    } else {
        let start = start.map_or(n - 1, |s| clamp(s, -1, n - 1));
        let stop = stop.map_or(-1, |s| clamp(s, -1, n - 1));
        let count = if start > stop {
            (start - stop - 1) / -step + 1
        } else {
            0
        };
        Ok((start, count as usize))
    }
}

/// An advanced item after validation: the intermediate axis it occupies
/// and the positions it selects.
struct Advanced {
    axis: usize,
    positions: Vec<usize>,
}

fn expand_ellipsis(array_ndim: usize, items: &[IndexSpec]) -> Result<Vec<IndexSpec>> {
    let ellipses = items
        .iter()
        .filter(|i| matches!(i, IndexSpec::Ellipsis))
        .count();
    if ellipses > 1 {
        return Err(Error::index_shape("an index can only have a single ellipsis"));
    }

    let consumed = items.iter().filter(|i| i.consumes_axis()).count();
    if consumed > array_ndim {
        return Err(Error::index_shape(format!(
            "too many indices: array is {array_ndim}-dimensional, but {consumed} were indexed"
        )));
    }
    let fill = array_ndim - consumed;

    let mut expanded = Vec::with_capacity(items.len() + fill);
    let mut filled = false;
    for item in items {
        if matches!(item, IndexSpec::Ellipsis) {
            expanded.extend(std::iter::repeat(IndexSpec::All).take(fill));
            filled = true;
        } else {
            expanded.push(item.clone());
        }
    }
    if !filled {
        expanded.extend(std::iter::repeat(IndexSpec::All).take(fill));
    }
    Ok(expanded)
}

/// Resolves `items` against `layout`.
pub(crate) fn resolve(layout: &Layout, items: &[IndexSpec]) -> Result<Selection> {
    let items = expand_ellipsis(layout.ndim(), items)?;

    let mut shape = Shape::new();
    let mut strides = Strides::new();
    let mut offset = layout.offset() as isize;
    let mut advanced: Vec<Advanced> = Vec::new();
    let mut d = 0;

    for item in &items {
        match item {
            IndexSpec::Index(i) => {
                let pos = wrap_index(*i, layout.shape()[d])?;
                offset += pos as isize * layout.strides()[d];
                d += 1;
            }
            IndexSpec::Range { start, stop, step } => {
                let (first, count) = slice_bounds(*start, *stop, *step, layout.shape()[d])?;
                if count > 0 {
                    offset += first * layout.strides()[d];
                }
                let stride = if count <= 1 {
                    layout.strides()[d]
                } else {
                    layout.strides()[d]
                        .checked_mul(*step)
                        .ok_or_else(|| Error::index_shape("slice step out of range"))?
                };
                shape.push(count);
                strides.push(stride);
                d += 1;
            }
            IndexSpec::All => {
                shape.push(layout.shape()[d]);
                strides.push(layout.strides()[d]);
                d += 1;
            }
            IndexSpec::NewAxis => {
                shape.push(1);
                strides.push(0);
            }
            IndexSpec::Mask(mask) => {
                let size = layout.shape()[d];
                if mask.len() != size {
                    return Err(Error::index_shape(format!(
                        "boolean index of length {} does not match axis of length {size}",
                        mask.len()
                    )));
                }
                let positions = mask
                    .iter()
                    .enumerate()
                    .filter_map(|(i, &m)| m.then_some(i))
                    .collect();
                advanced.push(Advanced {
                    axis: shape.len(),
                    positions,
                });
                shape.push(size);
                strides.push(layout.strides()[d]);
                d += 1;
            }
            IndexSpec::Take(list) => {
                let size = layout.shape()[d];
                let positions = list
                    .iter()
                    .map(|&i| wrap_index(i, size))
                    .collect::<Result<Vec<_>>>()?;
                advanced.push(Advanced {
                    axis: shape.len(),
                    positions,
                });
                shape.push(size);
                strides.push(layout.strides()[d]);
                d += 1;
            }
            IndexSpec::Ellipsis => unreachable!("ellipsis expanded above"),
        }
    }

    if advanced.is_empty() {
        return Ok(Selection::View(Layout::new(
            shape,
            strides,
            layout.descr(),
            offset as usize,
        )));
    }

    gather_plan(&shape, &strides, offset, &advanced)
}

/// Plans a coordinated gather over the intermediate view `shape`/`strides`.
fn gather_plan(
    shape: &[usize],
    strides: &[isize],
    offset: isize,
    advanced: &[Advanced],
) -> Result<Selection> {
    // Lengths must agree; single-position items broadcast.
    let mut len = 1usize;
    for adv in advanced {
        let n = adv.positions.len();
        if n == 1 {
            continue;
        }
        if len != 1 && n != len {
            return Err(Error::index_shape(format!(
                "index arrays could not be combined: lengths {len} and {n}"
            )));
        }
        len = n;
    }
    if advanced.iter().all(|a| a.positions.len() == 1) {
        len = 1;
    }

    let bases: Vec<isize> = (0..len)
        .map(|j| {
            advanced.iter().fold(offset, |acc, adv| {
                let pos = if adv.positions.len() == 1 {
                    adv.positions[0]
                } else {
                    adv.positions[j]
                };
                acc + pos as isize * strides[adv.axis]
            })
        })
        .collect();

    let is_advanced = |axis: usize| advanced.iter().any(|a| a.axis == axis);
    let first = advanced[0].axis;
    let adjacent = advanced
        .iter()
        .enumerate()
        .all(|(k, a)| a.axis == first + k);

    let rest: Vec<usize> = (0..shape.len()).filter(|&a| !is_advanced(a)).collect();
    // Gathered axis goes where the advanced items were when they are
    // adjacent, else in front.
    let split = if adjacent {
        rest.iter().take_while(|&&a| a < first).count()
    } else {
        0
    };

    let outer_shape: Vec<usize> = rest[..split].iter().map(|&a| shape[a]).collect();
    let outer_strides: Vec<isize> = rest[..split].iter().map(|&a| strides[a]).collect();
    let inner_shape: Vec<usize> = rest[split..].iter().map(|&a| shape[a]).collect();
    let inner_strides: Vec<isize> = rest[split..].iter().map(|&a| strides[a]).collect();

    let outer = OffsetIter::relative(&outer_shape, &outer_strides);
    let inner = OffsetIter::relative(&inner_shape, &inner_strides);

    let mut addresses = Vec::with_capacity(outer.len() * len * inner.len());
    for &o in &outer {
        for &base in &bases {
            for &i in &inner {
                addresses.push((base + o + i) as usize);
            }
        }
    }

    let mut result_shape = Shape::with_capacity(outer_shape.len() + 1 + inner_shape.len());
    result_shape.extend_from_slice(&outer_shape);
    result_shape.push(len);
    result_shape.extend_from_slice(&inner_shape);

    Ok(Selection::Gather {
        shape: result_shape,
        addresses,
    })
}

// =============================================================================
// Indexing Implementation
// =============================================================================

impl ArrayHandle {
    /// Reads through an index expression.
    ///
    /// Basic expressions return a view sharing this buffer. Expressions
    /// containing a mask or index list return a new, owned copy.
    pub fn index(&self, items: &[IndexSpec]) -> Result<Self> {
        match resolve(&self.layout, items)? {
            Selection::View(layout) => Ok(self.view_with(layout)),
            Selection::Gather { shape, addresses } => {
                tracing::debug!(
                    elements = addresses.len(),
                    shape = ?shape.as_slice(),
                    "advanced index copies selection"
                );
                let itemsize = self.itemsize();
                let data = self.buffer.read();
                let mut out = Vec::with_capacity(addresses.len() * itemsize);
                for &address in &addresses {
                    out.extend_from_slice(&data[address..address + itemsize]);
                }
                drop(data);
                let layout = Layout::packed(&shape, self.descr(), Order::C);
                Ok(Self::from_owned(Buffer::from_vec(out), layout))
            }
        }
    }

    /// Writes through an index expression into this array's own buffer.
    ///
    /// For advanced expressions the selected positions of `self` are
    /// written (scatter), not a copy. Repeated positions receive the last
    /// value. Nothing is written unless the whole assignment is valid.
    pub fn assign(&self, items: &[IndexSpec], source: Assign<'_>) -> Result<()> {
        let selection = resolve(&self.layout, items)?;
        let addresses = selection.addresses();
        let descr = self.descr();
        let itemsize = descr.itemsize();

        // Encode every source element up front; the source may alias `self`.
        let encoded: Vec<u8> = match source {
            Assign::Scalar(value) => {
                let mut element = vec![0u8; itemsize];
                descr.write(&value, &mut element)?;
                element
            }
            Assign::Array(array) => {
                let values = array.to_values();
                if values.len() != 1 && values.len() != addresses.len() {
                    return Err(Error::shape_mismatch(selection.shape(), array.shape()));
                }
                let mut bytes = vec![0u8; values.len() * itemsize];
                for (value, chunk) in values.iter().zip(bytes.chunks_exact_mut(itemsize.max(1))) {
                    descr.write(value, chunk)?;
                }
                bytes
            }
        };
        let broadcast = encoded.len() == itemsize;

        let mut data = self.buffer.write()?;
        for (k, &address) in addresses.iter().enumerate() {
            let src = if broadcast {
                &encoded[..]
            } else {
                &encoded[k * itemsize..(k + 1) * itemsize]
            };
            data[address..address + itemsize].copy_from_slice(src);
        }
        Ok(())
    }
}

/// Builds a boolean mask from a predicate over `array`'s elements in C order.
pub fn mask_where<F>(array: &ArrayHandle, predicate: F) -> Vec<bool>
where
    F: Fn(&Value) -> bool,
{
    array.to_values().iter().map(predicate).collect()
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::creation::{arange, zeros};
    use ndview_core::DType;

    fn rows_by_index() -> ArrayHandle {
        // Row i is [i, i, i].
        let x = zeros(&[4, 3], DType::F64);
        for (i, row) in x.rows().unwrap().iter().enumerate() {
            row.fill(i as f64).unwrap();
        }
        x
    }

    fn grid() -> ArrayHandle {
        arange(12).reshape(&[3, 4]).unwrap()
    }

    #[test]
    fn test_slice_is_view() {
        let x = ArrayHandle::from_vec((1..=9).collect::<Vec<i64>>(), &[9]).unwrap();
        let y = x.index(&[s_range(2, 6, 1)]).unwrap();
        assert!(y.shares_buffer(&x));
        assert_eq!(y.to_vec::<i64>().unwrap(), vec![3, 4, 5, 6]);

        y.set(&[0], 10).unwrap();
        assert_eq!(
            x.to_vec::<i64>().unwrap(),
            vec![1, 2, 10, 4, 5, 6, 7, 8, 9]
        );
    }

    #[test]
    fn test_slice_stride_and_offset() {
        let x = arange(10);
        let y = x.index(&[s_range(1, 8, 3)]).unwrap();
        assert_eq!(y.strides(), &[24]);
        assert_eq!(y.layout().offset(), 8);
        assert_eq!(y.to_vec::<i64>().unwrap(), vec![1, 4, 7]);

        let rev = x.index(&[s_step(-1)]).unwrap();
        assert_eq!(rev.to_vec::<i64>().unwrap(), (0..10).rev().collect::<Vec<_>>());

        let tail = x.index(&[s_from(-3)]).unwrap();
        assert_eq!(tail.to_vec::<i64>().unwrap(), vec![7, 8, 9]);

        let none = x.index(&[s_range(8, 2, 1)]).unwrap();
        assert_eq!(none.size(), 0);

        assert!(matches!(
            x.index(&[s_step(0)]),
            Err(Error::IndexShape { .. })
        ));
    }

    #[test]
    fn test_extreme_slice_steps() {
        let x = arange(5);

        let first = x.index(&[s_step(isize::MAX)]).unwrap();
        assert_eq!(first.to_vec::<i64>().unwrap(), vec![0]);
        assert!(first.shares_buffer(&x));

        let last = x.index(&[s_step(isize::MIN + 1)]).unwrap();
        assert_eq!(last.to_vec::<i64>().unwrap(), vec![4]);

        let grid = arange(6).reshape(&[2, 3]).unwrap();
        let cols = grid.index(&[IndexSpec::All, s_step(isize::MAX)]).unwrap();
        assert_eq!(cols.to_vec::<i64>().unwrap(), vec![0, 3]);

        assert!(matches!(
            x.index(&[s_step(isize::MIN)]),
            Err(Error::IndexShape { .. })
        ));
        assert!(matches!(
            x.index(&[s_range(isize::MIN, isize::MAX, isize::MAX)]),
            Ok(ref y) if y.size() == 1
        ));
    }

    #[test]
    fn test_2d_basic_indexing() {
        let arr = grid();
        let v = arr.index(&[IndexSpec::Index(2), IndexSpec::Index(3)]).unwrap();
        assert!(v.is_scalar());
        assert_eq!(v.item().unwrap(), Value::Int(11));

        let block = arr.index(&[s_to(2), s_from(1)]).unwrap();
        assert_eq!(block.shape(), &[2, 3]);
        assert_eq!(block.to_vec::<i64>().unwrap(), vec![1, 2, 3, 5, 6, 7]);

        assert_eq!(arr.index(&[IndexSpec::Index(1), s_to(2)]).unwrap().shape(), &[2]);
        assert_eq!(
            arr.index(&[s_range(1, 2, 1), s_to(2)]).unwrap().shape(),
            &[1, 2]
        );
        assert_eq!(
            arr.index(&[IndexSpec::Ellipsis, IndexSpec::Index(-1)]).unwrap().to_vec::<i64>().unwrap(),
            vec![3, 7, 11]
        );
        assert_eq!(
            arr.index(&[IndexSpec::NewAxis, IndexSpec::All]).unwrap().shape(),
            &[1, 3, 4]
        );
    }

    #[test]
    fn test_index_errors() {
        let arr = grid();
        assert!(matches!(
            arr.index(&[IndexSpec::Index(3)]),
            Err(Error::IndexRange { index: 3, size: 3 })
        ));
        assert!(matches!(
            arr.index(&[IndexSpec::Index(0), IndexSpec::Index(0), IndexSpec::Index(0)]),
            Err(Error::IndexShape { .. })
        ));
        assert!(matches!(
            arr.index(&[IndexSpec::Ellipsis, IndexSpec::Ellipsis]),
            Err(Error::IndexShape { .. })
        ));
    }

    #[test]
    fn test_fancy_row_select() {
        let x = rows_by_index();
        let y = x.index(&[vec![1isize, 3, 2].into()]).unwrap();
        assert!(!y.shares_buffer(&x));
        assert!(y.owns_buffer());
        assert_eq!(
            y.to_vec::<f64>().unwrap(),
            vec![1.0, 1.0, 1.0, 3.0, 3.0, 3.0, 2.0, 2.0, 2.0]
        );

        y.set(&[0, 0], 99.0).unwrap();
        assert_eq!(x.get(&[1, 0]).unwrap(), Value::Float(1.0));
    }

    #[test]
    fn test_fancy_negative_wrap_and_range() {
        let x = rows_by_index();
        let y = x.index(&[vec![-1isize, 0, -4].into()]).unwrap();
        assert_eq!(y.get(&[0, 0]).unwrap(), Value::Float(3.0));
        assert_eq!(y.get(&[2, 0]).unwrap(), Value::Float(0.0));

        assert!(matches!(
            x.index(&[vec![-5isize].into()]),
            Err(Error::IndexRange { index: -5, size: 4 })
        ));
        assert!(matches!(
            x.index(&[vec![4isize].into()]),
            Err(Error::IndexRange { index: 4, size: 4 })
        ));
    }

    #[test]
    fn test_paired_fancy_is_elementwise() {
        let x = rows_by_index();
        x.set(&[3, 0], 30.0).unwrap();
        let z = x
            .index(&[vec![1isize, 2, 3].into(), vec![2isize, 2, 0].into()])
            .unwrap();
        assert_eq!(z.shape(), &[3]);
        assert_eq!(z.to_vec::<f64>().unwrap(), vec![1.0, 2.0, 30.0]);

        assert!(matches!(
            x.index(&[vec![1isize, 2].into(), vec![0isize, 1, 2].into()]),
            Err(Error::IndexShape { .. })
        ));
    }

    #[test]
    fn test_fancy_then_column_reorder() {
        let x = grid();
        let rows = x.index(&[vec![1isize, 2].into()]).unwrap();
        let a = rows
            .index(&[IndexSpec::All, vec![2isize, 0, 1].into()])
            .unwrap();
        assert_eq!(a.shape(), &[2, 3]);
        assert_eq!(a.to_vec::<i64>().unwrap(), vec![6, 4, 5, 10, 8, 9]);

        // A basic step after a copy views the copy, not the source.
        let tail = rows.index(&[IndexSpec::All, s_from(2)]).unwrap();
        assert!(tail.shares_buffer(&rows));
        assert!(!tail.shares_buffer(&x));
    }

    #[test]
    fn test_mixed_basic_and_fancy_placement() {
        let x = arange(24).reshape(&[2, 3, 4]).unwrap();

        // Adjacent advanced item in the middle stays in place.
        let mid = x
            .index(&[IndexSpec::All, vec![0isize, 2].into(), IndexSpec::All])
            .unwrap();
        assert_eq!(mid.shape(), &[2, 2, 4]);
        assert_eq!(mid.get(&[1, 1, 3]).unwrap(), x.get(&[1, 2, 3]).unwrap());

        // Separated advanced items move the gathered axis to the front.
        let split = x
            .index(&[vec![0isize, 1].into(), IndexSpec::All, vec![3isize, 0].into()])
            .unwrap();
        assert_eq!(split.shape(), &[2, 3]);
        assert_eq!(split.get(&[1, 2]).unwrap(), x.get(&[1, 2, 0]).unwrap());
    }

    #[test]
    fn test_boolean_mask_copies() {
        let names = ArrayHandle::from_values(
            &["ali", "mohammad", "ali", "hassan"].map(Value::from),
            &[4],
            DType::Bytes(8),
        )
        .unwrap();
        let mask = mask_where(&names, |v| {
            *v == Value::Bytes(b"ali\0\0\0\0\0".to_vec())
        });
        assert_eq!(mask, vec![true, false, true, false]);

        let data = arange(16).reshape(&[4, 4]).unwrap();
        let picked = data.index(&[mask.clone().into()]).unwrap();
        assert_eq!(picked.shape(), &[2, 4]);
        assert_eq!(picked.get(&[1, 0]).unwrap(), Value::Int(8));

        picked.set(&[0, 0], 999).unwrap();
        let again = data.index(&[mask.into()]).unwrap();
        assert_eq!(again.get(&[0, 0]).unwrap(), Value::Int(0));
    }

    #[test]
    fn test_boolean_mask_length_mismatch() {
        let data = arange(4);
        assert!(matches!(
            data.index(&[vec![true, false].into()]),
            Err(Error::IndexShape { .. })
        ));
    }

    #[test]
    fn test_assign_basic_writes_source() {
        let x = arange(6);
        x.assign(&[s_range(1, 4, 1)], Assign::Scalar(Value::Int(-1)))
            .unwrap();
        assert_eq!(x.to_vec::<i64>().unwrap(), vec![0, -1, -1, -1, 4, 5]);
    }

    #[test]
    fn test_assign_fancy_scatters_into_source() {
        let x = arange(6);
        x.assign(&[vec![0isize, 5, -2].into()], Assign::Scalar(Value::Int(7)))
            .unwrap();
        assert_eq!(x.to_vec::<i64>().unwrap(), vec![7, 1, 2, 3, 7, 7]);

        let mask = mask_where(&x, |v| *v == Value::Int(7));
        let src = ArrayHandle::from_vec(vec![10i64, 20, 30], &[3]).unwrap();
        x.assign(&[mask.into()], Assign::Array(&src)).unwrap();
        assert_eq!(x.to_vec::<i64>().unwrap(), vec![10, 1, 2, 3, 20, 30]);
    }

    #[test]
    fn test_assign_is_all_or_nothing() {
        let x = arange(4);
        let err = x.assign(&[vec![0isize, 9].into()], Assign::Scalar(Value::Int(5)));
        assert!(matches!(err, Err(Error::IndexRange { .. })));
        assert_eq!(x.to_vec::<i64>().unwrap(), vec![0, 1, 2, 3]);

        let wrong = ArrayHandle::from_vec(vec![1i64, 2, 3], &[3]).unwrap();
        let err = x.assign(&[vec![0isize, 1].into()], Assign::Array(&wrong));
        assert!(matches!(err, Err(Error::ShapeMismatch { .. })));
        assert_eq!(x.to_vec::<i64>().unwrap(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_assign_from_aliasing_source() {
        let x = arange(4);
        let reversed = x.index(&[s_step(-1)]).unwrap();
        x.assign(&[IndexSpec::All], Assign::Array(&reversed)).unwrap();
        assert_eq!(x.to_vec::<i64>().unwrap(), vec![3, 2, 1, 0]);
    }

    #[test]
    fn test_assign_read_only_rejected() {
        let x = ArrayHandle::from_bytes_readonly(
            bytes::Bytes::from_static(&[1, 2, 3]),
            ndview_core::Descr::native(DType::U8),
            None,
        )
        .unwrap();
        let err = x.assign(&[vec![0isize].into()], Assign::Scalar(Value::UInt(0)));
        assert_eq!(err, Err(Error::ReadOnlyBuffer));
    }
}
