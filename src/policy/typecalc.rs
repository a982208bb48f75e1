// src/policy/typecalc.rs
//! The Miniscript type calculus (spec.md §4.7). Every function here is a pure,
//! exhaustively-matched derivation from children's flags to a parent's flags — the
//! "exhaustive pattern matching catching missing-case bugs at compile time" redesign
//! spec.md §9 asks for, replacing `wallet.c`'s inline `switch` arms (lines 670-1176 and
//! 1412-1573 of `wallet.c`) with a small set of named, independently testable functions.

use crate::error::CoreError;
use crate::limits::MAX_COSIGNERS;
use crate::policy::node::{MiniscriptType as Ty, NodeFlags};

fn require_miniscript(flags: &NodeFlags, what: &'static str) -> Result<(), CoreError> {
    if !flags.is_miniscript {
        return Err(CoreError::TypeError(what));
    }
    Ok(())
}

fn require_type(flags: &NodeFlags, ty: Ty, what: &'static str) -> Result<(), CoreError> {
    if flags.ty != ty {
        return Err(CoreError::TypeError(what));
    }
    Ok(())
}

// --- Leaf flags (spec.md §4.7 "Leaf flags" table) --------------------------------------

pub fn constant_zero() -> NodeFlags {
    NodeFlags::miniscript(Ty::B, true, false, false, true, true)
}

pub fn constant_one() -> NodeFlags {
    NodeFlags::miniscript(Ty::B, true, false, false, false, true)
}

pub fn pk() -> NodeFlags {
    NodeFlags::miniscript(Ty::B, false, true, true, true, true)
}

pub fn pkh() -> NodeFlags {
    NodeFlags::miniscript(Ty::B, false, false, true, true, true)
}

pub fn pk_k() -> NodeFlags {
    NodeFlags::miniscript(Ty::K, false, true, true, true, true)
}

pub fn pk_h() -> NodeFlags {
    NodeFlags::miniscript(Ty::K, false, false, true, true, true)
}

pub fn older_after() -> NodeFlags {
    NodeFlags::miniscript(Ty::B, true, false, false, false, false)
}

pub fn hash_image() -> NodeFlags {
    // sha256/hash256/ripemd160/hash160 share the same flag vector.
    NodeFlags::miniscript(Ty::B, true, true, false, true, true)
}

pub fn multi() -> NodeFlags {
    NodeFlags::miniscript(Ty::B, false, false, true, true, true)
}

// --- Composition rules (spec.md §4.7 "Composition rules") -------------------------------

/// `andor(X,Y,Z)`: X is Bdu; Y,Z same type in {B,K,V}.
pub fn andor(x: &NodeFlags, y: &NodeFlags, z: &NodeFlags) -> Result<NodeFlags, CoreError> {
    require_miniscript(x, "andor children must be miniscript")?;
    require_miniscript(y, "andor children must be miniscript")?;
    require_miniscript(z, "andor children must be miniscript")?;
    require_type(x, Ty::B, "andor: X must be type B")?;
    if !x.d || !x.u {
        return Err(CoreError::TypeError("andor: X must have properties d and u"));
    }
    if y.ty != z.ty {
        return Err(CoreError::TypeError("andor: Y and Z must have the same type"));
    }
    if y.ty == Ty::W {
        return Err(CoreError::TypeError("andor: Y/Z must be B, K or V"));
    }
    Ok(NodeFlags::miniscript(
        y.ty,
        x.z & y.z & z.z,
        (x.z & y.o & z.o) | (x.o & y.z & z.z),
        false,
        z.d,
        y.u & z.u,
    ))
}

/// `and_v(X,Y)`: X is V; Y in {B,K,V}.
pub fn and_v(x: &NodeFlags, y: &NodeFlags) -> Result<NodeFlags, CoreError> {
    require_miniscript(x, "and_v children must be miniscript")?;
    require_miniscript(y, "and_v children must be miniscript")?;
    require_type(x, Ty::V, "and_v: X must be type V")?;
    if y.ty == Ty::W {
        return Err(CoreError::TypeError("and_v: Y must be B, K or V"));
    }
    Ok(NodeFlags::miniscript(
        y.ty,
        x.z & y.z,
        (x.z & y.o) | (x.o & y.z),
        x.n | (x.z & y.n),
        false,
        y.u,
    ))
}

/// `and_b(X,Y)`: X is B; Y is W.
pub fn and_b(x: &NodeFlags, y: &NodeFlags) -> Result<NodeFlags, CoreError> {
    require_miniscript(x, "and_b children must be miniscript")?;
    require_miniscript(y, "and_b children must be miniscript")?;
    require_type(x, Ty::B, "and_b: X must be type B")?;
    require_type(y, Ty::W, "and_b: Y must be type W")?;
    Ok(NodeFlags::miniscript(
        Ty::B,
        x.z & y.z,
        (x.z & y.o) | (x.o & y.z),
        x.n | (x.z & y.n),
        x.d & y.d,
        y.u,
    ))
}

/// `and_n(X,Y)`: equivalent to `andor(X,Y,0)`; X is Bdu, Y is B.
pub fn and_n(x: &NodeFlags, y: &NodeFlags) -> Result<NodeFlags, CoreError> {
    require_miniscript(x, "and_n children must be miniscript")?;
    require_miniscript(y, "and_n children must be miniscript")?;
    require_type(x, Ty::B, "and_n: X must be type B")?;
    if !x.d || !x.u {
        return Err(CoreError::TypeError("and_n: X must have properties d and u"));
    }
    require_type(y, Ty::B, "and_n: Y must be type B")?;
    Ok(NodeFlags::miniscript(
        Ty::B,
        x.z & y.z,
        x.o & y.z,
        false,
        true,
        y.u,
    ))
}

/// `or_b(X,Z)`: X is Bd; Z is Wd.
pub fn or_b(x: &NodeFlags, z: &NodeFlags) -> Result<NodeFlags, CoreError> {
    require_miniscript(x, "or_b children must be miniscript")?;
    require_miniscript(z, "or_b children must be miniscript")?;
    require_type(x, Ty::B, "or_b: X must be type B")?;
    if !x.d {
        return Err(CoreError::TypeError("or_b: X must have property d"));
    }
    require_type(z, Ty::W, "or_b: Z must be type W")?;
    if !z.d {
        return Err(CoreError::TypeError("or_b: Z must have property d"));
    }
    Ok(NodeFlags::miniscript(
        Ty::B,
        x.z & z.z,
        (x.z & z.o) | (x.o & z.z),
        false,
        true,
        true,
    ))
}

/// `or_c(X,Z)`: X is Bdu; Z is V.
pub fn or_c(x: &NodeFlags, z: &NodeFlags) -> Result<NodeFlags, CoreError> {
    require_miniscript(x, "or_c children must be miniscript")?;
    require_miniscript(z, "or_c children must be miniscript")?;
    require_type(x, Ty::B, "or_c: X must be type B")?;
    if !x.d || !x.u {
        return Err(CoreError::TypeError("or_c: X must have properties d and u"));
    }
    require_type(z, Ty::V, "or_c: Z must be type V")?;
    Ok(NodeFlags::miniscript(Ty::V, x.z & z.z, x.o & z.o, false, false, false))
}

/// `or_d(X,Z)`: X is Bdu; Z is B.
pub fn or_d(x: &NodeFlags, z: &NodeFlags) -> Result<NodeFlags, CoreError> {
    require_miniscript(x, "or_d children must be miniscript")?;
    require_miniscript(z, "or_d children must be miniscript")?;
    require_type(x, Ty::B, "or_d: X must be type B")?;
    if !x.d || !x.u {
        return Err(CoreError::TypeError("or_d: X must have properties d and u"));
    }
    require_type(z, Ty::B, "or_d: Z must be type B")?;
    Ok(NodeFlags::miniscript(Ty::B, x.z & z.z, x.o & z.o, false, z.d, z.u))
}

/// `or_i(X,Z)`: X,Z same type in {B,K,V}.
pub fn or_i(x: &NodeFlags, z: &NodeFlags) -> Result<NodeFlags, CoreError> {
    require_miniscript(x, "or_i children must be miniscript")?;
    require_miniscript(z, "or_i children must be miniscript")?;
    if x.ty == Ty::W {
        return Err(CoreError::TypeError("or_i: X must be B, K or V"));
    }
    if x.ty != z.ty {
        return Err(CoreError::TypeError("or_i: X and Z must have the same type"));
    }
    Ok(NodeFlags::miniscript(x.ty, false, x.z & z.z, false, x.d | z.d, x.u & z.u))
}

/// `thresh(k, X1..Xn)`: X1 is Bdu; Xi>=2 are Wdu. `children` is the flags of every child
/// in order, including the first. `cz`/`co` are the `z`/`o` vote counts across *all*
/// children (spec.md's `count_z`/`count_o`, accumulated over the whole list).
pub fn thresh(children: &[NodeFlags]) -> Result<NodeFlags, CoreError> {
    let n = children.len();
    if n == 0 {
        return Err(CoreError::OutOfRange("thresh requires at least one child"));
    }
    let mut count_z = 0u32;
    let mut count_o = 0u32;
    for (i, child) in children.iter().enumerate() {
        require_miniscript(child, "thresh children must be miniscript")?;
        if i == 0 {
            require_type(child, Ty::B, "thresh: first child must be type B")?;
        } else {
            require_type(child, Ty::W, "thresh: children after the first must be type W")?;
        }
        if !child.d || !child.u {
            return Err(CoreError::TypeError("thresh: every child must have properties d and u"));
        }
        if child.z {
            count_z += 1;
        }
        if child.o {
            count_o += 1;
        }
    }
    let n = n as u32;
    Ok(NodeFlags::miniscript(
        Ty::B,
        count_z == n,
        count_z == n - 1 && count_o == 1,
        false,
        false,
        false,
    ))
}

/// Validates `1 <= k <= n <= MAX_COSIGNERS` for `multi`/`sortedmulti`.
pub fn check_multisig_arity(k: u32, n: u32) -> Result<(), CoreError> {
    if !(1 <= k && k <= n && n <= MAX_COSIGNERS) {
        return Err(CoreError::OutOfRange("multi/sortedmulti requires 1 <= k <= n <= 16"));
    }
    Ok(())
}

// --- Wrapper rules (spec.md §4.7 "Wrapper rules") ---------------------------------------

pub fn wrap_a(x: &NodeFlags) -> Result<NodeFlags, CoreError> {
    require_miniscript(x, "wrapper applied to a non-miniscript child")?;
    require_type(x, Ty::B, "'a' wrapper requires a B type child")?;
    Ok(NodeFlags::miniscript(Ty::W, false, false, false, x.d, x.u))
}

pub fn wrap_s(x: &NodeFlags) -> Result<NodeFlags, CoreError> {
    require_miniscript(x, "wrapper applied to a non-miniscript child")?;
    if x.ty != Ty::B || !x.o {
        return Err(CoreError::TypeError("'s' wrapper requires a Bo type child"));
    }
    Ok(NodeFlags::miniscript(Ty::W, false, false, false, x.d, x.u))
}

pub fn wrap_c(x: &NodeFlags) -> Result<NodeFlags, CoreError> {
    require_miniscript(x, "wrapper applied to a non-miniscript child")?;
    require_type(x, Ty::K, "'c' wrapper requires a K type child")?;
    Ok(NodeFlags::miniscript(Ty::B, false, x.o, x.n, x.d, true))
}

pub fn wrap_t(x: &NodeFlags) -> Result<NodeFlags, CoreError> {
    require_miniscript(x, "wrapper applied to a non-miniscript child")?;
    require_type(x, Ty::V, "'t' wrapper requires a V type child")?;
    Ok(NodeFlags::miniscript(Ty::B, x.z, x.o, x.n, false, true))
}

pub fn wrap_d(x: &NodeFlags) -> Result<NodeFlags, CoreError> {
    require_miniscript(x, "wrapper applied to a non-miniscript child")?;
    if x.ty != Ty::V || !x.z {
        return Err(CoreError::TypeError("'d' wrapper requires a Vz type child"));
    }
    Ok(NodeFlags::miniscript(Ty::B, false, true, true, true, false))
}

pub fn wrap_v(x: &NodeFlags) -> Result<NodeFlags, CoreError> {
    require_miniscript(x, "wrapper applied to a non-miniscript child")?;
    require_type(x, Ty::B, "'v' wrapper requires a B type child")?;
    Ok(NodeFlags::miniscript(Ty::V, x.z, x.o, x.n, false, false))
}

pub fn wrap_j(x: &NodeFlags) -> Result<NodeFlags, CoreError> {
    require_miniscript(x, "wrapper applied to a non-miniscript child")?;
    if x.ty != Ty::B || !x.n {
        return Err(CoreError::TypeError("'j' wrapper requires a Bn type child"));
    }
    Ok(NodeFlags::miniscript(Ty::B, false, x.o, true, true, x.u))
}

pub fn wrap_n(x: &NodeFlags) -> Result<NodeFlags, CoreError> {
    require_miniscript(x, "wrapper applied to a non-miniscript child")?;
    require_type(x, Ty::B, "'n' wrapper requires a B type child")?;
    Ok(NodeFlags::miniscript(Ty::B, x.z, x.o, x.n, x.d, true))
}

pub fn wrap_l(x: &NodeFlags) -> Result<NodeFlags, CoreError> {
    // l:X == or_i(0,X)
    require_miniscript(x, "wrapper applied to a non-miniscript child")?;
    require_type(x, Ty::B, "'l' wrapper requires a B type child")?;
    Ok(NodeFlags::miniscript(Ty::B, false, x.z, false, true, x.u))
}

pub fn wrap_u(x: &NodeFlags) -> Result<NodeFlags, CoreError> {
    // u:X == or_i(X,0)
    require_miniscript(x, "wrapper applied to a non-miniscript child")?;
    require_type(x, Ty::B, "'u' wrapper requires a B type child")?;
    Ok(NodeFlags::miniscript(Ty::B, false, x.z, false, true, x.u))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lex::Wrapper;
    use crate::policy::typecalc;

    fn apply_wrapper(w: Wrapper, x: &NodeFlags) -> Result<NodeFlags, CoreError> {
        match w {
            Wrapper::A => wrap_a(x),
            Wrapper::S => wrap_s(x),
            Wrapper::C => wrap_c(x),
            Wrapper::T => wrap_t(x),
            Wrapper::D => wrap_d(x),
            Wrapper::V => wrap_v(x),
            Wrapper::J => wrap_j(x),
            Wrapper::N => wrap_n(x),
            Wrapper::L => wrap_l(x),
            Wrapper::U => wrap_u(x),
        }
    }

    #[test]
    fn c_wrapper_on_pk_k() {
        let x = typecalc::pk_k();
        let wrapped = apply_wrapper(Wrapper::C, &x).unwrap();
        assert_eq!(wrapped.ty, Ty::B);
        assert!(!wrapped.z);
        assert!(wrapped.o);
        assert!(wrapped.n);
        assert!(wrapped.d);
        assert!(wrapped.u);
    }

    #[test]
    fn and_v_of_v_pk_and_older() {
        let vpk = wrap_v(&pk()).unwrap();
        let older = older_after();
        let root = and_v(&vpk, &older).unwrap();
        assert_eq!(root.ty, Ty::B);
        assert!(!root.u);
        assert!(!root.d);
    }

    #[test]
    fn thresh_all_z_sets_z() {
        let children = [constant_zero(), constant_zero(), constant_zero()];
        let flags = thresh(&children).unwrap();
        assert!(flags.z);
    }

    #[test]
    fn thresh_rejects_non_w_tail() {
        let children = [constant_zero(), pk()]; // pk() is type B, not W
        assert!(thresh(&children).is_err());
    }

    #[test]
    fn andor_requires_matching_yz_types() {
        let x = constant_zero();
        let y = pk_k(); // type K
        let z = pk();   // type B
        assert!(andor(&x, &y, &z).is_err());
    }

    #[test]
    fn multisig_arity_bounds() {
        assert!(check_multisig_arity(1, 1).is_ok());
        assert!(check_multisig_arity(2, 3).is_ok());
        assert!(check_multisig_arity(0, 3).is_err());
        assert!(check_multisig_arity(4, 3).is_err());
        assert!(check_multisig_arity(1, 17).is_err());
    }
}
