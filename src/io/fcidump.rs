//! FCIDUMP integral files
//!
//! The header is a Fortran namelist (`&FCI NORB=..,NELEC=.., ... &END` or `/`)
//! followed by one `value i j k l` record per line with 1-based spatial indices:
//!
//! * `i j k l` all non-zero: two-electron integral `(ij|kl)`
//! * `k = l = 0`: one-electron integral `h_ij`
//! * all zero: nuclear repulsion
//!
//! Records with only `i` non-zero (orbital energies) are ignored.

use color_eyre::eyre::{eyre, Result, WrapErr};
use crate::error::FcidumpError;
use crate::hamiltonian::Hamiltonian;
use ndarray::{Array2, Array4};
use std::fs;
use std::path::Path;
use tracing::info;

/// Spatial-orbital integrals read from an FCIDUMP file.
#[derive(Debug, Clone)]
pub struct Fcidump {
    pub norb: usize,
    pub nelec: usize,
    pub nuclear_repulsion: f64,
    /// `h[p,q]`
    pub h1: Array2<f64>,
    /// `(pq|rs)` in chemist notation
    pub eri: Array4<f64>,
}

/// Spin-orbital Hamiltonian built from an [`Fcidump`] and its reference energy.
#[derive(Debug, Clone)]
pub struct SpinSystem {
    /// Fock one-body part and antisymmetrized two-body part
    pub hamiltonian: Hamiltonian,
    pub reference_energy: f64,
}

impl Fcidump {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .wrap_err_with(|| format!("Unable to read FCIDUMP file: {}", path.display()))?;
        Self::parse(&text).wrap_err_with(|| format!("Malformed FCIDUMP file: {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        let mut lines = text.lines();
        let mut header = String::new();
        let mut terminated = false;
        for line in lines.by_ref() {
            let trimmed = line.trim();
            header.push_str(trimmed);
            header.push(',');
            if trimmed.to_ascii_uppercase().ends_with("&END") || trimmed.ends_with('/') {
                terminated = true;
                break;
            }
        }
        if !terminated {
            return Err(FcidumpError::MissingTerminator.into());
        }
        let norb = header_value(&header, "NORB")?;
        let nelec = header_value(&header, "NELEC")?;

        let mut h1 = Array2::zeros((norb, norb));
        let mut eri = Array4::zeros((norb, norb, norb, norb));
        let mut nuclear_repulsion = 0.0;

        for (lineno, line) in lines.enumerate() {
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.is_empty() {
                continue;
            }
            if fields.len() != 5 {
                return Err(eyre!("record {} has {} fields: {:?}", lineno + 1, fields.len(), line));
            }
            let value: f64 = fields[0]
                .replace(['D', 'd'], "E")
                .parse()
                .wrap_err_with(|| format!("Bad integral value {:?}", fields[0]))?;
            let mut idx = [0usize; 4];
            for (slot, field) in idx.iter_mut().zip(&fields[1..]) {
                *slot = field
                    .parse()
                    .wrap_err_with(|| format!("Bad orbital index {:?}", field))?;
                if *slot > norb {
                    return Err(eyre!("orbital index {} exceeds NORB = {}", slot, norb));
                }
            }
            match idx {
                [0, 0, 0, 0] => nuclear_repulsion = value,
                [i, j, 0, 0] if i > 0 && j > 0 => {
                    h1[[i - 1, j - 1]] = value;
                    h1[[j - 1, i - 1]] = value;
                }
                [i, j, k, l] if i > 0 && j > 0 && k > 0 && l > 0 => {
                    let (p, q, r, s) = (i - 1, j - 1, k - 1, l - 1);
                    for (a, b, c, d) in [
                        (p, q, r, s),
                        (q, p, r, s),
                        (p, q, s, r),
                        (q, p, s, r),
                        (r, s, p, q),
                        (s, r, p, q),
                        (r, s, q, p),
                        (s, r, q, p),
                    ] {
                        eri[[a, b, c, d]] = value;
                    }
                }
                _ => {}
            }
        }

        Ok(Fcidump {
            norb,
            nelec,
            nuclear_repulsion,
            h1,
            eri,
        })
    }

    /// Spin-orbital Fock matrix and `<pq||rs>` with the lowest `nelec` spin orbitals occupied.
    ///
    /// Spin orbital `2p + σ` carries spatial orbital `p` with spin `σ`.
    pub fn spin_system(&self, nelec: usize) -> Result<SpinSystem> {
        let n = 2 * self.norb;
        if nelec > n {
            return Err(eyre!("{} electrons do not fit in {} spin orbitals", nelec, n));
        }
        let spatial = |p: usize| p / 2;
        let same_spin = |p: usize, q: usize| p % 2 == q % 2;

        let h1 = Array2::from_shape_fn((n, n), |(p, q)| {
            if same_spin(p, q) {
                self.h1[[spatial(p), spatial(q)]]
            } else {
                0.0
            }
        });
        let coulomb = |p: usize, q: usize, r: usize, s: usize| {
            if same_spin(p, r) && same_spin(q, s) {
                self.eri[[spatial(p), spatial(r), spatial(q), spatial(s)]]
            } else {
                0.0
            }
        };
        let h2 = Array4::from_shape_fn((n, n, n, n), |(p, q, r, s)| {
            coulomb(p, q, r, s) - coulomb(p, q, s, r)
        });

        let fock = Array2::from_shape_fn((n, n), |(p, q)| {
            h1[[p, q]] + (0..nelec).map(|m| h2[[p, m, q, m]]).sum::<f64>()
        });
        let one_body: f64 = (0..nelec).map(|i| h1[[i, i]]).sum();
        let two_body: f64 = (0..nelec)
            .flat_map(|i| (0..nelec).map(move |j| (i, j)))
            .map(|(i, j)| h2[[i, j, i, j]])
            .sum();
        let reference_energy = self.nuclear_repulsion + one_body + 0.5 * two_body;

        info!("===========================================");
        info!("         FCIDUMP Integrals");
        info!("===========================================");
        info!("Spatial orbitals: {}", self.norb);
        info!("Electrons: {}", nelec);
        info!("Nuclear repulsion: {:.10} Eh", self.nuclear_repulsion);
        info!("Reference energy: {:.10} Eh", reference_energy);

        let hamiltonian = Hamiltonian::new(fock, h2, nelec)?;
        Ok(SpinSystem {
            hamiltonian,
            reference_energy,
        })
    }
}

/// Value of `key` in the namelist, tolerating whitespace around `=` and a leading `&FCI`.
fn header_value(header: &str, key: &'static str) -> Result<usize, FcidumpError> {
    let raw = header
        .split(',')
        .filter_map(|entry| entry.split_once('='))
        .find(|(name, _)| {
            name.split_whitespace()
                .last()
                .is_some_and(|word| word.eq_ignore_ascii_case(key))
        })
        .map(|(_, value)| value.trim())
        .ok_or(FcidumpError::MissingKey { key })?;
    let digits: String = raw.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().map_err(|_| FcidumpError::BadHeaderValue {
        key,
        value: raw.to_string(),
    })
}
