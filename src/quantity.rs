//! Catalog of the field quantities that can be evaluated and interpolated.

use crate::error::{BoozerError, Result};
use lazy_static::lazy_static;
use std::{collections::HashMap, fmt, str::FromStr};

#[cfg(feature = "serialization")]
use serde::{Deserialize, Serialize};

/// A quantity provided by a Boozer field.
///
/// Bundles (`*Derivs`) stack several first derivatives into one multi-component value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub enum Quantity {
    ModB,
    DModBDs,
    DModBDtheta,
    DModBDzeta,
    ModBDerivs,
    G,
    DGDs,
    I,
    DIDs,
    Iota,
    DIotaDs,
    Psip,
    K,
    DKDtheta,
    DKDzeta,
    KDerivs,
    Nu,
    DNuDs,
    DNuDtheta,
    DNuDzeta,
    NuDerivs,
    R,
    DRDs,
    DRDtheta,
    DRDzeta,
    RDerivs,
    Z,
    DZDs,
    DZDtheta,
    DZDzeta,
    ZDerivs,
}

/// Which part of the grid a quantity varies over.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Domain {
    /// Varies with all three coordinates.
    Full,
    /// Depends on `s` only.
    FluxFunction,
}

/// Behaviour of a quantity under the stellarator reflection
/// `(theta, zeta) -> (-theta, -zeta)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Parity {
    Odd,
    Even,
    /// Not affected by the reflection at all.
    None,
}

/// Static properties of a quantity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QuantityDescriptor {
    pub quantity: Quantity,
    pub name: &'static str,
    pub arity: usize,
    pub domain: Domain,
    pub parity: Parity,
}

macro_rules! descriptor {
    ($quantity:ident, $name:expr, $arity:expr, $domain:ident, $parity:ident) => {
        QuantityDescriptor {
            quantity: Quantity::$quantity,
            name: $name,
            arity: $arity,
            domain: Domain::$domain,
            parity: Parity::$parity,
        }
    };
}

/// Descriptors of all quantities, in declaration order of `Quantity`.
pub const CATALOG: [QuantityDescriptor; Quantity::COUNT] = [
    descriptor!(ModB, "modB", 1, Full, Even),
    descriptor!(DModBDs, "dmodBds", 1, Full, Even),
    descriptor!(DModBDtheta, "dmodBdtheta", 1, Full, Odd),
    descriptor!(DModBDzeta, "dmodBdzeta", 1, Full, Odd),
    descriptor!(ModBDerivs, "modB_derivs", 3, Full, Even),
    descriptor!(G, "G", 1, FluxFunction, None),
    descriptor!(DGDs, "dGds", 1, FluxFunction, None),
    descriptor!(I, "I", 1, FluxFunction, None),
    descriptor!(DIDs, "dIds", 1, FluxFunction, None),
    descriptor!(Iota, "iota", 1, FluxFunction, None),
    descriptor!(DIotaDs, "diotads", 1, FluxFunction, None),
    descriptor!(Psip, "psip", 1, FluxFunction, None),
    descriptor!(K, "K", 1, Full, Odd),
    descriptor!(DKDtheta, "dKdtheta", 1, Full, Even),
    descriptor!(DKDzeta, "dKdzeta", 1, Full, Even),
    descriptor!(KDerivs, "K_derivs", 2, Full, Even),
    descriptor!(Nu, "nu", 1, Full, Odd),
    descriptor!(DNuDs, "dnuds", 1, Full, Odd),
    descriptor!(DNuDtheta, "dnudtheta", 1, Full, Even),
    descriptor!(DNuDzeta, "dnudzeta", 1, Full, Even),
    descriptor!(NuDerivs, "nu_derivs", 3, Full, Odd),
    descriptor!(R, "R", 1, Full, Even),
    descriptor!(DRDs, "dRds", 1, Full, Even),
    descriptor!(DRDtheta, "dRdtheta", 1, Full, Odd),
    descriptor!(DRDzeta, "dRdzeta", 1, Full, Odd),
    descriptor!(RDerivs, "R_derivs", 3, Full, Even),
    descriptor!(Z, "Z", 1, Full, Odd),
    descriptor!(DZDs, "dZds", 1, Full, Odd),
    descriptor!(DZDtheta, "dZdtheta", 1, Full, Even),
    descriptor!(DZDzeta, "dZdzeta", 1, Full, Even),
    descriptor!(ZDerivs, "Z_derivs", 3, Full, Odd),
];

lazy_static! {
    static ref QUANTITIES_BY_NAME: HashMap<&'static str, Quantity> = CATALOG
        .iter()
        .map(|descriptor| (descriptor.name, descriptor.quantity))
        .collect();
}

impl Quantity {
    /// Number of quantities in the catalog.
    pub const COUNT: usize = 31;

    /// Returns an iterator over all quantities.
    pub fn all() -> impl Iterator<Item = Self> {
        CATALOG.iter().map(|descriptor| descriptor.quantity)
    }

    /// Returns the position of the quantity in the catalog.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Returns the static properties of the quantity.
    pub fn descriptor(self) -> &'static QuantityDescriptor {
        &CATALOG[self.index()]
    }

    pub fn name(self) -> &'static str {
        self.descriptor().name
    }

    pub fn arity(self) -> usize {
        self.descriptor().arity
    }

    pub fn domain(self) -> Domain {
        self.descriptor().domain
    }

    pub fn parity(self) -> Parity {
        self.descriptor().parity
    }

    pub fn is_flux_function(self) -> bool {
        self.domain() == Domain::FluxFunction
    }

    /// Returns the single-valued quantities stacked into this bundle,
    /// or `None` if the quantity is not a bundle.
    pub fn bundle_components(self) -> Option<&'static [Quantity]> {
        use Quantity::*;
        match self {
            ModBDerivs => Some(&[DModBDs, DModBDtheta, DModBDzeta]),
            KDerivs => Some(&[DKDtheta, DKDzeta]),
            NuDerivs => Some(&[DNuDs, DNuDtheta, DNuDzeta]),
            RDerivs => Some(&[DRDs, DRDtheta, DRDzeta]),
            ZDerivs => Some(&[DZDs, DZDtheta, DZDzeta]),
            _ => Option::None,
        }
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Quantity {
    type Err = BoozerError;

    fn from_str(name: &str) -> Result<Self> {
        QUANTITIES_BY_NAME
            .get(name)
            .copied()
            .ok_or_else(|| BoozerError::UnknownQuantity(name.to_string()))
    }
}

/// Invokes the given macro with `getter_name => Variant` pairs for every quantity.
#[macro_export]
macro_rules! for_each_quantity {
    ($callback:ident) => {
        $callback! {
            mod_b => ModB,
            dmod_b_ds => DModBDs,
            dmod_b_dtheta => DModBDtheta,
            dmod_b_dzeta => DModBDzeta,
            mod_b_derivs => ModBDerivs,
            g => G,
            dg_ds => DGDs,
            i => I,
            di_ds => DIDs,
            iota => Iota,
            diota_ds => DIotaDs,
            psip => Psip,
            k => K,
            dk_dtheta => DKDtheta,
            dk_dzeta => DKDzeta,
            k_derivs => KDerivs,
            nu => Nu,
            dnu_ds => DNuDs,
            dnu_dtheta => DNuDtheta,
            dnu_dzeta => DNuDzeta,
            nu_derivs => NuDerivs,
            r => R,
            dr_ds => DRDs,
            dr_dtheta => DRDtheta,
            dr_dzeta => DRDzeta,
            r_derivs => RDerivs,
            z => Z,
            dz_ds => DZDs,
            dz_dtheta => DZDtheta,
            dz_dzeta => DZDzeta,
            z_derivs => ZDerivs
        }
    };
}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn catalog_is_ordered_like_the_enum() {
        for (idx, descriptor) in CATALOG.iter().enumerate() {
            assert_eq!(descriptor.quantity.index(), idx, "{}", descriptor.name);
        }
        assert_eq!(Quantity::all().count(), Quantity::COUNT);
    }

    #[test]
    fn names_parse_back_to_quantities() {
        for quantity in Quantity::all() {
            assert_eq!(quantity.name().parse::<Quantity>().unwrap(), quantity);
        }
        assert!(matches!(
            "modb".parse::<Quantity>(),
            Err(BoozerError::UnknownQuantity(_))
        ));
    }

    #[test]
    fn bundle_arity_matches_component_count() {
        for quantity in Quantity::all() {
            match quantity.bundle_components() {
                Some(components) => {
                    assert_eq!(components.len(), quantity.arity());
                    assert!(components.iter().all(|component| component.arity() == 1));
                }
                None => assert_eq!(quantity.arity(), 1, "{}", quantity),
            }
        }
    }

    #[test]
    fn flux_functions_carry_no_parity() {
        for quantity in Quantity::all().filter(|quantity| quantity.is_flux_function()) {
            assert_eq!(quantity.parity(), Parity::None);
        }
    }
}
