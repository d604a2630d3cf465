//! # Dense Arrays
//!
//! `Array` is the built-in array value: an f32 buffer in row-major order with
//! a [`Shape`] descriptor. The context registers it for additive combination
//! and zero construction at start-up, through the same capability traits any
//! other array type would implement.

use std::fmt;

use zeroad_core::{Aval, CoreError, JaxVal, Shape};

use crate::add::Combinable;
use crate::zeros::ZeroConstructible;

/// A dense f32 array.
#[derive(Debug, Clone, PartialEq)]
pub struct Array {
    /// Shape of the array
    pub shape: Shape,
    /// Flattened data in row-major order
    pub data: Vec<f32>,
}

impl Array {
    /// Create an array filled with zeros.
    pub fn zeros(shape: Shape) -> Self {
        let size = shape.numel();
        Self {
            shape,
            data: vec![0.0; size],
        }
    }

    /// Create an array filled with a constant value.
    pub fn full(shape: Shape, value: f32) -> Self {
        let size = shape.numel();
        Self {
            shape,
            data: vec![value; size],
        }
    }

    /// Create an array from data with the given shape.
    pub fn from_data(shape: Shape, data: Vec<f32>) -> Result<Self, CoreError> {
        if data.len() != shape.numel() {
            return Err(CoreError::ShapeMismatch {
                expected: shape.clone(),
                got: Shape::vector(shape.dtype, data.len()),
            });
        }
        Ok(Self { shape, data })
    }

    pub fn scalar(value: f32) -> Self {
        Self {
            shape: Shape::f32_scalar(),
            data: vec![value],
        }
    }

    pub fn vector(data: Vec<f32>) -> Self {
        Self {
            shape: Shape::f32_vector(data.len()),
            data,
        }
    }

    pub fn matrix(rows: usize, cols: usize, data: Vec<f32>) -> Result<Self, CoreError> {
        Self::from_data(Shape::f32_matrix(rows, cols), data)
    }

    /// The single element of a one-element array.
    pub fn as_scalar(&self) -> Option<f32> {
        match self.data.as_slice() {
            [value] => Some(*value),
            _ => None,
        }
    }

    /// Total number of elements.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Element-wise addition.
    pub fn add(&self, other: &Array) -> Result<Array, CoreError> {
        if !self.shape.is_compatible(&other.shape) {
            return Err(CoreError::ShapeMismatch {
                expected: self.shape.clone(),
                got: other.shape.clone(),
            });
        }
        let data = self
            .data
            .iter()
            .zip(other.data.iter())
            .map(|(a, b)| a + b)
            .collect();
        Ok(Array {
            shape: self.shape.clone(),
            data,
        })
    }

    pub fn is_all_zero(&self) -> bool {
        self.data.iter().all(|x| *x == 0.0)
    }
}

impl fmt::Display for Array {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:?}", self.shape, self.data)
    }
}

impl JaxVal for Array {
    fn aval(&self) -> Result<Aval, CoreError> {
        Ok(Aval::new(self.shape.clone()))
    }
}

impl Combinable for Array {
    fn add(&self, other: &Self) -> Result<Self, CoreError> {
        Array::add(self, other)
    }
}

impl ZeroConstructible for Array {
    type Descriptor = Shape;

    fn zero_for(aval: &Shape) -> Self {
        Array::zeros(aval.clone())
    }
}
