//! Geometric utility objects for Boozer coordinates.

use crate::num::BFloat;
use ndarray::ArrayView1;
use std::{fmt, ops::Index};

#[cfg(feature = "serialization")]
use serde::{Deserialize, Serialize};

#[cfg(any(test, feature = "for-testing"))]
use approx::AbsDiffEq;

/// Denotes the flux coordinate or one of the two Boozer angles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub enum Dim3 {
    S = 0,
    Theta = 1,
    Zeta = 2,
}

impl Dim3 {
    /// Creates an array for iterating over the s-, theta- and zeta-dimensions.
    pub fn slice() -> [Self; 3] {
        [Self::S, Self::Theta, Self::Zeta]
    }

    /// Returns the number of the dimension.
    pub fn num(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Dim3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::S => "s",
                Self::Theta => "theta",
                Self::Zeta => "zeta",
            }
        )
    }
}

use Dim3::{Theta, Zeta, S};

/// Represents any quantity with one component per Boozer coordinate.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct In3D<T>([T; 3]);

impl<T> In3D<T> {
    /// Creates a new 3D quantity given the three components.
    pub fn new(s: T, theta: T, zeta: T) -> Self {
        Self([s, theta, zeta])
    }

    /// Creates a new 3D quantity by evaluating the given component
    /// constructor for each dimension.
    pub fn with_each_component<C>(create_component: C) -> Self
    where
        C: Fn(Dim3) -> T,
    {
        Self::new(
            create_component(S),
            create_component(Theta),
            create_component(Zeta),
        )
    }

    /// Creates a new 3D quantity by applying the given mapping to each component.
    pub fn map<U, M>(&self, map_component: M) -> In3D<U>
    where
        M: Fn(Dim3, &T) -> U,
    {
        In3D::with_each_component(|dim| map_component(dim, &self[dim]))
    }

    /// Returns an iterator over the components.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.0.iter()
    }
}

impl<T> Index<Dim3> for In3D<T> {
    type Output = T;
    fn index(&self, dim: Dim3) -> &Self::Output {
        &self.0[dim as usize]
    }
}

impl<T: fmt::Display> fmt::Display for In3D<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        fmt::Display::fmt(&self[S], f)?;
        f.write_str(", ")?;
        fmt::Display::fmt(&self[Theta], f)?;
        f.write_str(", ")?;
        fmt::Display::fmt(&self[Zeta], f)?;
        f.write_str("]")
    }
}

#[cfg(any(test, feature = "for-testing"))]
impl<T> AbsDiffEq for In3D<T>
where
    T: AbsDiffEq,
    T::Epsilon: Copy,
{
    type Epsilon = <T as AbsDiffEq>::Epsilon;

    fn default_epsilon() -> Self::Epsilon {
        T::default_epsilon()
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
        T::abs_diff_eq(&self[S], &other[S], epsilon)
            && T::abs_diff_eq(&self[Theta], &other[Theta], epsilon)
            && T::abs_diff_eq(&self[Zeta], &other[Zeta], epsilon)
    }
}

/// A point in Boozer coordinates `(s, theta, zeta)`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct Point3<F>(In3D<F>);

impl<F: BFloat> Point3<F> {
    /// Creates a new point given the three coordinates.
    pub fn new(s: F, theta: F, zeta: F) -> Self {
        Self(In3D::new(s, theta, zeta))
    }

    /// Creates a point from a `(s, theta, zeta)` row of a point batch.
    ///
    /// # Panics
    ///
    /// If the row has fewer than three elements.
    pub fn from_row(row: ArrayView1<F>) -> Self {
        Self::new(row[0], row[1], row[2])
    }

    /// Returns the normalized toroidal flux coordinate.
    pub fn s(&self) -> F {
        self[S]
    }

    /// Returns the poloidal Boozer angle.
    pub fn theta(&self) -> F {
        self[Theta]
    }

    /// Returns the toroidal Boozer angle.
    pub fn zeta(&self) -> F {
        self[Zeta]
    }

    /// Returns the coordinates as an `[s, theta, zeta]` array.
    pub fn to_array(&self) -> [F; 3] {
        [self[S], self[Theta], self[Zeta]]
    }
}

impl<F: BFloat> Index<Dim3> for Point3<F> {
    type Output = F;
    fn index(&self, dim: Dim3) -> &Self::Output {
        &self.0[dim]
    }
}

#[cfg(any(test, feature = "for-testing"))]
impl<F> AbsDiffEq for Point3<F>
where
    F: BFloat + AbsDiffEq,
    F::Epsilon: Copy,
{
    type Epsilon = <In3D<F> as AbsDiffEq>::Epsilon;

    fn default_epsilon() -> Self::Epsilon {
        In3D::<F>::default_epsilon()
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
        In3D::<F>::abs_diff_eq(&self.0, &other.0, epsilon)
    }
}
