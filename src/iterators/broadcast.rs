// Copyright 2024 ndset developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.
use super::Baseiter;
use crate::dimension::{broadcast_all, broadcast_strides, default_strides};
use crate::element::Element;
use crate::error::{bail, DatasetError, Result};
use crate::layout::Geometry;
use crate::{Dataset, Ix};

/// Buffer indices of the two operands and the output at one position.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PairIndex {
    pub a: usize,
    pub b: usize,
    pub o: usize,
}

/// Buffer indices of the three operands and the output at one position.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TripleIndex {
    pub a: usize,
    pub b: usize,
    pub c: usize,
    pub o: usize,
}

/// Common item size of compound operands: equal widths, or width 1 against
/// anything.
fn common_item_size(sizes: &[usize]) -> Result<usize> {
    let mut out = 1;
    for &s in sizes {
        if s != 1 && out != 1 && s != out {
            bail!(DatasetError::IncompatibleItemSize { a: out, b: s });
        }
        out = out.max(s);
    }
    Ok(out)
}

/// Walks the broadcast shape of its operands plus an output.
///
/// The output is either a caller-provided view of exactly the broadcast
/// shape (written in place when it shares storage with an operand) or a
/// fresh dense buffer the caller allocates with [`shape`](Self::shape) and
/// [`item_size`](Self::item_size).
#[derive(Clone, Debug)]
struct Broadcaster {
    inner: Baseiter,
    shape: Vec<Ix>,
    item_size: usize,
    in_place: bool,
}

impl Broadcaster {
    fn new(operands: &[Geometry], output: Option<(Geometry, bool)>) -> Result<Self> {
        let shapes: Vec<&[Ix]> = operands.iter().map(|g| &g.shape[..]).collect();
        let shape = broadcast_all(&shapes)?;
        let sizes: Vec<usize> = operands.iter().map(|g| g.item_size).collect();
        let item_size = common_item_size(&sizes)?;

        let mut ops = Vec::with_capacity(operands.len() + 1);
        for g in operands {
            ops.push((g.offset, broadcast_strides(&g.shape, &g.strides, &shape)?));
        }
        let in_place = match output {
            Some((o, shared)) => {
                if o.shape != shape {
                    bail!(DatasetError::shapes(&o.shape, &shape));
                }
                if o.item_size != item_size {
                    bail!(DatasetError::IncompatibleItemSize {
                        a: o.item_size,
                        b: item_size,
                    });
                }
                ops.push((o.offset, o.strides));
                shared
            }
            None => {
                ops.push((0, default_strides(&shape, item_size)));
                false
            }
        };
        Ok(Broadcaster {
            inner: Baseiter::new(shape.clone(), ops),
            shape,
            item_size,
            in_place,
        })
    }
}

macro_rules! broadcast_accessors {
    () => {
        /// Broadcast shape of the operands.
        pub fn shape(&self) -> &[Ix] {
            &self.base.shape
        }

        /// Item size of the output.
        pub fn item_size(&self) -> usize {
            self.base.item_size
        }

        /// The output shares storage with an operand.
        pub fn is_in_place(&self) -> bool {
            self.base.in_place
        }

        /// Arithmetic runs in double precision rather than `i64`.
        pub fn is_output_double(&self) -> bool {
            self.as_double
        }

        /// Force double precision regardless of operand kinds.
        pub fn set_output_double(&mut self, force: bool) {
            self.as_double = self.as_double || force;
        }

        /// Position in the broadcast shape of the indices last yielded.
        pub fn pos(&self) -> &[Ix] {
            &self.base.inner.pos
        }
    };
}

/// Pairs two operands of broadcast-compatible shapes.
///
/// Along an axis where an operand has length 1, or which it lacks, its index
/// stays fixed.
#[derive(Clone, Debug)]
pub struct BroadcastPairIter {
    base: Broadcaster,
    as_double: bool,
}

impl BroadcastPairIter {
    /// Iterate `a` and `b` with a fresh dense output.
    pub fn new<A: Element, B: Element>(a: &Dataset<A>, b: &Dataset<B>) -> Result<Self> {
        Ok(BroadcastPairIter {
            base: Broadcaster::new(&[a.geometry(), b.geometry()], None)?,
            as_double: A::is_float() || B::is_float(),
        })
    }

    /// Iterate `a` and `b` writing to `out`, which must have the broadcast shape.
    pub fn with_output<A: Element, B: Element, O: Element>(
        a: &Dataset<A>,
        b: &Dataset<B>,
        out: &Dataset<O>,
    ) -> Result<Self> {
        let shared = out.shares_buffer(a) || out.shares_buffer(b);
        Ok(BroadcastPairIter {
            base: Broadcaster::new(&[a.geometry(), b.geometry()], Some((out.geometry(), shared)))?,
            as_double: A::is_float() || B::is_float(),
        })
    }

    broadcast_accessors!();
}

impl Iterator for BroadcastPairIter {
    type Item = PairIndex;

    #[inline]
    fn next(&mut self) -> Option<PairIndex> {
        if !self.base.inner.next() {
            return None;
        }
        let c = &self.base.inner.current;
        Some(PairIndex {
            a: c[0] as usize,
            b: c[1] as usize,
            o: c[2] as usize,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.base.inner.len();
        (len, Some(len))
    }
}

impl ExactSizeIterator for BroadcastPairIter {}

/// Walks three operands, e.g. a condition and two choices, in lock step.
#[derive(Clone, Debug)]
pub struct BroadcastTripleIter {
    base: Broadcaster,
    as_double: bool,
}

impl BroadcastTripleIter {
    pub fn new<A: Element, B: Element, C: Element>(
        a: &Dataset<A>,
        b: &Dataset<B>,
        c: &Dataset<C>,
    ) -> Result<Self> {
        Ok(BroadcastTripleIter {
            base: Broadcaster::new(&[a.geometry(), b.geometry(), c.geometry()], None)?,
            as_double: A::is_float() || B::is_float() || C::is_float(),
        })
    }

    broadcast_accessors!();
}

impl Iterator for BroadcastTripleIter {
    type Item = TripleIndex;

    #[inline]
    fn next(&mut self) -> Option<TripleIndex> {
        if !self.base.inner.next() {
            return None;
        }
        let c = &self.base.inner.current;
        Some(TripleIndex {
            a: c[0] as usize,
            b: c[1] as usize,
            c: c[2] as usize,
            o: c[3] as usize,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.base.inner.len();
        (len, Some(len))
    }
}

impl ExactSizeIterator for BroadcastTripleIter {}
