//! Epoch initialisation and secular/drag terms shared by both theories

use super::EpochElements;
use crate::gravity::Geopotential;

/// Quantities fixed by the epoch elements and the geopotential.
#[derive(Debug, Clone, Copy)]
pub(super) struct EpochTerms {
    /// Recovered semi-major axis, earth radii
    pub ao: f64,
    pub cosio: f64,
    pub cosio2: f64,
    pub sinio: f64,
    pub eccsq: f64,
    pub omeosq: f64,
    pub rteosq: f64,
    pub con41: f64,
    pub con42: f64,
    pub posq: f64,
    /// Perigee radius, earth radii
    pub rp: f64,
}

impl EpochTerms {
    pub fn new(epoch: &EpochElements, geo: &Geopotential) -> Self {
        let eccsq = epoch.ecco * epoch.ecco;
        let omeosq = 1.0 - eccsq;
        let rteosq = omeosq.sqrt();
        let cosio = epoch.inclo.cos();
        let cosio2 = cosio * cosio;
        let ao = (geo.xke / epoch.no_unkozai).powf(2.0 / 3.0);
        let po = ao * omeosq;
        let con42 = 1.0 - 5.0 * cosio2;

        EpochTerms {
            ao,
            cosio,
            cosio2,
            sinio: epoch.inclo.sin(),
            eccsq,
            omeosq,
            rteosq,
            con41: -con42 - cosio2 - cosio2,
            con42,
            posq: po * po,
            rp: ao * (1.0 - epoch.ecco),
        }
    }
}

/// Rates of the angular elements from J2, J4 and (for the node) drag.
#[derive(Debug, Clone, Copy)]
pub(super) struct SecularRates {
    pub mdot: f64,
    pub argpdot: f64,
    pub nodedot: f64,
    pub nodecf: f64,
}

/// Inclination-dependent long and short period coefficients.
#[derive(Debug, Clone, Copy)]
pub(super) struct ShortPeriodTerms {
    pub sinip: f64,
    pub cosip: f64,
    pub aycof: f64,
    pub xlcof: f64,
    pub con41: f64,
    pub x1mth2: f64,
    pub x7thm1: f64,
}

impl ShortPeriodTerms {
    pub fn new(inclination: f64, geo: &Geopotential) -> Self {
        let sinip = inclination.sin();
        let cosip = inclination.cos();
        let cosisq = cosip * cosip;
        // guard the 1/(1 + cos i) singularity for i = 180°
        let denominator = if (cosip + 1.0).abs() > 1.5e-12 {
            1.0 + cosip
        } else {
            1.5e-12
        };

        ShortPeriodTerms {
            sinip,
            cosip,
            aycof: -0.5 * geo.j3oj2 * sinip,
            xlcof: -0.25 * geo.j3oj2 * sinip * (3.0 + 5.0 * cosip) / denominator,
            con41: 3.0 * cosisq - 1.0,
            x1mth2: 1.0 - cosisq,
            x7thm1: 7.0 * cosisq - 1.0,
        }
    }
}

/// Mean elements after secular gravity and drag, before resonance or
/// lunar-solar terms.
#[derive(Debug, Clone, Copy)]
pub(super) struct SecularState {
    pub argpm: f64,
    pub mm: f64,
    pub nodem: f64,
    /// Drag scaling of the semi-major axis
    pub tempa: f64,
    /// Drag decrement of the eccentricity
    pub tempe: f64,
    /// Drag increment of the mean longitude, in units of mean motion
    pub templ: f64,
}

/// Drag and secular coefficients of the near-earth theory.
#[derive(Debug, Clone)]
pub(super) struct NearEarth {
    /// Perigee below 220 km (or deep space): truncated drag polynomial
    pub simplified: bool,
    pub rates: SecularRates,
    pub short_period: ShortPeriodTerms,
    cc1: f64,
    cc4: f64,
    cc5: f64,
    d2: f64,
    d3: f64,
    d4: f64,
    delmo: f64,
    eta: f64,
    omgcof: f64,
    sinmao: f64,
    t2cof: f64,
    t3cof: f64,
    t4cof: f64,
    t5cof: f64,
    xmcof: f64,
}

impl NearEarth {
    pub fn new(
        epoch: &EpochElements,
        terms: &EpochTerms,
        geo: &Geopotential,
        deep_space: bool,
    ) -> Self {
        let EpochTerms {
            ao,
            cosio,
            cosio2,
            sinio,
            omeosq,
            rteosq,
            con41,
            con42,
            posq,
            rp,
            ..
        } = *terms;
        let ecco = epoch.ecco;
        let no = epoch.no_unkozai;
        let bstar = epoch.bstar;

        // atmospheric density parameters, s and (q0 - s)^4
        let mut sfour = 78.0 / geo.radius_km + 1.0;
        let mut qzms24 = ((120.0 - 78.0) / geo.radius_km).powi(4);
        let perigee_km = (rp - 1.0) * geo.radius_km;
        if perigee_km < 156.0 {
            sfour = if perigee_km < 98.0 {
                20.0
            } else {
                perigee_km - 78.0
            };
            qzms24 = ((120.0 - sfour) / geo.radius_km).powi(4);
            sfour = sfour / geo.radius_km + 1.0;
        }

        let pinvsq = 1.0 / posq;
        let tsi = 1.0 / (ao - sfour);
        let eta = ao * ecco * tsi;
        let etasq = eta * eta;
        let eeta = ecco * eta;
        let psisq = (1.0 - etasq).abs();
        let coef = qzms24 * tsi.powi(4);
        let coef1 = coef / psisq.powf(3.5);
        let cc2 = coef1
            * no
            * (ao * (1.0 + 1.5 * etasq + eeta * (4.0 + etasq))
                + 0.375 * geo.j2 * tsi / psisq * con41 * (8.0 + 3.0 * etasq * (8.0 + etasq)));
        let cc1 = bstar * cc2;
        let cc3 = if ecco > 1.0e-4 {
            -2.0 * coef * tsi * geo.j3oj2 * no * sinio / ecco
        } else {
            0.0
        };
        let x1mth2 = 1.0 - cosio2;
        let cc4 = 2.0
            * no
            * coef1
            * ao
            * omeosq
            * (eta * (2.0 + 0.5 * etasq) + ecco * (0.5 + 2.0 * etasq)
                - geo.j2 * tsi / (ao * psisq)
                    * (-3.0 * con41 * (1.0 - 2.0 * eeta + etasq * (1.5 - 0.5 * eeta))
                        + 0.75
                            * x1mth2
                            * (2.0 * etasq - eeta * (1.0 + etasq))
                            * (2.0 * epoch.argpo).cos()));
        let cc5 = 2.0 * coef1 * ao * omeosq * (1.0 + 2.75 * (etasq + eeta) + eeta * etasq);

        let cosio4 = cosio2 * cosio2;
        let temp1 = 1.5 * geo.j2 * pinvsq * no;
        let temp2 = 0.5 * temp1 * geo.j2 * pinvsq;
        let temp3 = -0.46875 * geo.j4 * pinvsq * pinvsq * no;
        let mdot = no
            + 0.5 * temp1 * rteosq * con41
            + 0.0625 * temp2 * rteosq * (13.0 - 78.0 * cosio2 + 137.0 * cosio4);
        let argpdot = -0.5 * temp1 * con42
            + 0.0625 * temp2 * (7.0 - 114.0 * cosio2 + 395.0 * cosio4)
            + temp3 * (3.0 - 36.0 * cosio2 + 49.0 * cosio4);
        let xhdot1 = -temp1 * cosio;
        let nodedot = xhdot1
            + (0.5 * temp2 * (4.0 - 19.0 * cosio2) + 2.0 * temp3 * (3.0 - 7.0 * cosio2)) * cosio;

        let xmcof = if ecco > 1.0e-4 {
            -(2.0 / 3.0) * coef * bstar / eeta
        } else {
            0.0
        };
        let delmo = (1.0 + eta * epoch.mo.cos()).powi(3);

        let simplified = deep_space || rp < 220.0 / geo.radius_km + 1.0;
        let (d2, d3, d4, t3cof, t4cof, t5cof) = if simplified {
            (0.0, 0.0, 0.0, 0.0, 0.0, 0.0)
        } else {
            let cc1sq = cc1 * cc1;
            let d2 = 4.0 * ao * tsi * cc1sq;
            let temp = d2 * tsi * cc1 / 3.0;
            let d3 = (17.0 * ao + sfour) * temp;
            let d4 = 0.5 * temp * ao * tsi * (221.0 * ao + 31.0 * sfour) * cc1;
            (
                d2,
                d3,
                d4,
                d2 + 2.0 * cc1sq,
                0.25 * (3.0 * d3 + cc1 * (12.0 * d2 + 10.0 * cc1sq)),
                0.2 * (3.0 * d4 + 12.0 * cc1 * d3 + 6.0 * d2 * d2 + 15.0 * cc1sq * (2.0 * d2 + cc1sq)),
            )
        };

        NearEarth {
            simplified,
            rates: SecularRates {
                mdot,
                argpdot,
                nodedot,
                nodecf: 3.5 * omeosq * xhdot1 * cc1,
            },
            short_period: ShortPeriodTerms::new(epoch.inclo, geo),
            cc1,
            cc4,
            cc5,
            d2,
            d3,
            d4,
            delmo,
            eta,
            omgcof: bstar * cc3 * epoch.argpo.cos(),
            sinmao: epoch.mo.sin(),
            t2cof: 1.5 * cc1,
            t3cof,
            t4cof,
            t5cof,
            xmcof,
        }
    }

    /// Secular gravity and drag at `t` minutes since epoch.
    pub fn secular(&self, epoch: &EpochElements, t: f64) -> SecularState {
        let xmdf = epoch.mo + self.rates.mdot * t;
        let argpdf = epoch.argpo + self.rates.argpdot * t;
        let nodedf = epoch.nodeo + self.rates.nodedot * t;
        let t2 = t * t;

        let mut state = SecularState {
            argpm: argpdf,
            mm: xmdf,
            nodem: nodedf + self.rates.nodecf * t2,
            tempa: 1.0 - self.cc1 * t,
            tempe: epoch.bstar * self.cc4 * t,
            templ: self.t2cof * t2,
        };

        if !self.simplified {
            let delomg = self.omgcof * t;
            let delm = self.xmcof * ((1.0 + self.eta * xmdf.cos()).powi(3) - self.delmo);
            let temp = delomg + delm;
            state.mm = xmdf + temp;
            state.argpm = argpdf - temp;
            let t3 = t2 * t;
            let t4 = t3 * t;
            state.tempa -= self.d2 * t2 + self.d3 * t3 + self.d4 * t4;
            state.tempe += epoch.bstar * self.cc5 * (state.mm.sin() - self.sinmao);
            state.templ += self.t3cof * t3 + t4 * (self.t4cof + t * self.t5cof);
        }

        state
    }
}
