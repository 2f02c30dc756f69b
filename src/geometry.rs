//! Geometric utility objects.

use crate::num::BFloat;
use std::{
    fmt,
    ops::{Index, IndexMut},
};

#[cfg(feature = "serialization")]
use serde::{Deserialize, Serialize};

/// Denotes the x-, y- or z-dimension.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Dim3 {
    X = 0,
    Y = 1,
    Z = 2,
}

impl Dim3 {
    /// Creates an array for iterating over the x-, y- and z-dimensions.
    pub fn slice() -> [Self; 3] {
        [Self::X, Self::Y, Self::Z]
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
                Self::X => "x",
                Self::Y => "y",
                Self::Z => "z",
            }
        )
    }
}

use Dim3::{X, Y, Z};

/// Represents any quantity with three dimensional components.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct In3D<T>([T; 3]);

impl<T> In3D<T> {
    /// Creates a new 3D quantity given the three components.
    pub fn new(x: T, y: T, z: T) -> Self {
        Self([x, y, z])
    }

    /// Creates a new 3D quantity by evaluating the given component
    /// constructor for each dimension.
    pub fn with_each_component<C>(create_component: C) -> Self
    where
        C: Fn(Dim3) -> T,
    {
        Self::new(
            create_component(X),
            create_component(Y),
            create_component(Z),
        )
    }

    /// Creates a new 3D quantity by applying the given function to each component.
    pub fn map<U, M>(&self, map_component: M) -> In3D<U>
    where
        M: Fn(&T) -> U,
    {
        In3D::new(
            map_component(&self[X]),
            map_component(&self[Y]),
            map_component(&self[Z]),
        )
    }

    /// Creates a new 3D quantity with the given value copied into all components.
    pub fn same(a: T) -> Self
    where
        T: Copy,
    {
        Self([a, a, a])
    }

    /// Returns the components as an array.
    pub fn to_array(&self) -> [T; 3]
    where
        T: Copy,
    {
        self.0
    }

    /// Returns an iterator over the components.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.0.iter()
    }
}

impl<T> From<[T; 3]> for In3D<T> {
    fn from(components: [T; 3]) -> Self {
        Self(components)
    }
}

impl<T> Index<Dim3> for In3D<T> {
    type Output = T;
    fn index(&self, dim: Dim3) -> &Self::Output {
        &self.0[dim as usize]
    }
}

impl<T> IndexMut<Dim3> for In3D<T> {
    fn index_mut(&mut self, dim: Dim3) -> &mut Self::Output {
        &mut self.0[dim as usize]
    }
}

impl<'a, T> IntoIterator for &'a In3D<T> {
    type Item = &'a T;
    type IntoIter = ::std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl<T> FromIterator<T> for In3D<T> {
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = T>,
    {
        let mut iter = iter.into_iter();
        let mut next = || {
            iter.next()
                .expect("Iterator for In3D must yield three components")
        };
        let x = next();
        let y = next();
        let z = next();
        Self([x, y, z])
    }
}

impl<T: fmt::Display> fmt::Display for In3D<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self[X], self[Y], self[Z])
    }
}

/// 3D index into a lattice or array.
pub type Idx3<I> = In3D<I>;

/// A point in 3D space.
pub type Point3<F> = In3D<F>;

/// Lower and upper coordinate of an interval along one dimension.
pub type Interval<F> = (F, F);

/// Whether the closed intervals `[lower_a, upper_a]` and `[lower_b, upper_b]` intersect.
///
/// Touching endpoints count as intersecting.
pub fn closed_intervals_overlap<F: BFloat>(lower_a: F, upper_a: F, lower_b: F, upper_b: F) -> bool {
    !(upper_b < lower_a || lower_b > upper_a)
}

/// An axis-aligned box in 3D space.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct BoundingBox3<F> {
    lower: Point3<F>,
    upper: Point3<F>,
}

impl<F: BFloat> BoundingBox3<F> {
    /// Creates a new box from its lower and upper corners.
    pub fn new(lower: Point3<F>, upper: Point3<F>) -> Self {
        Self { lower, upper }
    }

    /// Creates a new box from one `(lower, upper)` interval per dimension.
    pub fn from_intervals(intervals: &In3D<Interval<F>>) -> Self {
        Self::new(
            intervals.map(|&(lower, _)| lower),
            intervals.map(|&(_, upper)| upper),
        )
    }

    pub fn lower(&self) -> &Point3<F> {
        &self.lower
    }

    pub fn upper(&self) -> &Point3<F> {
        &self.upper
    }

    /// Returns the `(lower, upper)` interval along the given dimension.
    pub fn interval(&self, dim: Dim3) -> Interval<F> {
        (self.lower[dim], self.upper[dim])
    }

    /// Returns the center point of the box.
    pub fn center(&self) -> Point3<F> {
        let two = F::one() + F::one();
        Point3::with_each_component(|dim| (self.lower[dim] + self.upper[dim]) / two)
    }

    /// Whether this box and the given box intersect along every dimension,
    /// counting shared faces, edges and corners as intersections.
    pub fn overlaps(&self, other: &Self) -> bool {
        Dim3::slice().iter().all(|&dim| {
            closed_intervals_overlap(
                self.lower[dim],
                self.upper[dim],
                other.lower[dim],
                other.upper[dim],
            )
        })
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn touching_boxes_overlap() {
        let a = BoundingBox3::new(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0));
        let b = BoundingBox3::new(Point3::new(1.0, 0.5, 0.5), Point3::new(2.0, 2.0, 2.0));
        let c = BoundingBox3::new(Point3::new(1.0 + 1e-12, 0.0, 0.0), Point3::new(2.0, 1.0, 1.0));
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
        assert!(!a.overlaps(&c));
    }

    #[test]
    fn box_separated_along_single_axis_does_not_overlap() {
        let a = BoundingBox3::new(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0));
        let b = BoundingBox3::new(Point3::new(0.2, 0.2, 1.5), Point3::new(0.8, 0.8, 2.0));
        assert!(!a.overlaps(&b));
    }

    #[test]
    fn center_is_midpoint() {
        let bbox = BoundingBox3::from_intervals(&In3D::new((0.0, 1.0), (-2.0, 2.0), (4.0, 5.0)));
        assert_eq!(bbox.center(), Point3::new(0.5, 0.0, 4.5));
        assert_eq!(bbox.interval(Y), (-2.0, 2.0));
    }
}
