//! Biquad coefficient design
//!
//! Shelving, pass and peaking stages use the Audio EQ Cookbook
//! (R. Bristow-Johnson) transforms. The two `DeMan` stages use the
//! bilinear-transform parameterisation that reproduces the coefficient
//! table printed in ITU-R BS.1770 at 48 kHz.

use crate::error::{LoudnessError, Result};
use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

/// Exponent relating the band gain to the high gain of the DeMan shelf
const DEMAN_SHELF_VB_EXPONENT: f64 = 0.499_666_774_155;

/// Shape of a biquad stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterType {
    /// Second-order high-pass
    HighPass,
    /// Second-order low-pass
    LowPass,
    /// High shelf - boosts/cuts above the corner frequency
    HighShelf,
    /// Low shelf - boosts/cuts below the corner frequency
    LowShelf,
    /// Peaking - boosts/cuts around the centre frequency
    Peaking,
    /// Notch - rejects the centre frequency
    Notch,
    /// High shelf from the bilinear-transform design (BS.1770 stage 1)
    HighShelfDeMan,
    /// High-pass from the bilinear-transform design (BS.1770 stage 2)
    HighPassDeMan,
}

impl FilterType {
    /// Tag used in configuration files
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HighPass => "high_pass",
            Self::LowPass => "low_pass",
            Self::HighShelf => "high_shelf",
            Self::LowShelf => "low_shelf",
            Self::Peaking => "peaking",
            Self::Notch => "notch",
            Self::HighShelfDeMan => "high_shelf_DeMan",
            Self::HighPassDeMan => "high_pass_DeMan",
        }
    }
}

impl FromStr for FilterType {
    type Err = LoudnessError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "high_pass" | "highpass" => Ok(Self::HighPass),
            "low_pass" | "lowpass" => Ok(Self::LowPass),
            "high_shelf" | "highshelf" => Ok(Self::HighShelf),
            "low_shelf" | "lowshelf" => Ok(Self::LowShelf),
            "peaking" | "peak" => Ok(Self::Peaking),
            "notch" => Ok(Self::Notch),
            "high_shelf_deman" => Ok(Self::HighShelfDeMan),
            "high_pass_deman" => Ok(Self::HighPassDeMan),
            _ => Err(LoudnessError::InvalidFilterType(s.to_string())),
        }
    }
}

impl fmt::Display for FilterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalised biquad coefficients
///
/// `a0` has been divided out of every other coefficient, so the
/// difference equation is
/// `y[n] = b0 x[n] + b1 x[n-1] + b2 x[n-2] - a1 y[n-1] - a2 y[n-2]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coefficients {
    pub b0: f64,
    pub b1: f64,
    pub b2: f64,
    pub a1: f64,
    pub a2: f64,
}

impl Coefficients {
    fn normalized(b: [f64; 3], a: [f64; 3]) -> Self {
        let a0 = a[0];
        Self {
            b0: b[0] / a0,
            b1: b[1] / a0,
            b2: b[2] / a0,
            a1: a[1] / a0,
            a2: a[2] / a0,
        }
    }

    /// Magnitude response in dB at `freq_hz`
    pub fn magnitude_db(&self, freq_hz: f64, sample_rate: f64) -> f64 {
        let w = 2.0 * PI * freq_hz / sample_rate;
        let (cos1, sin1) = (w.cos(), w.sin());
        let (cos2, sin2) = ((2.0 * w).cos(), (2.0 * w).sin());

        let num_re = self.b0 + self.b1 * cos1 + self.b2 * cos2;
        let num_im = -(self.b1 * sin1 + self.b2 * sin2);
        let den_re = 1.0 + self.a1 * cos1 + self.a2 * cos2;
        let den_im = -(self.a1 * sin1 + self.a2 * sin2);

        let num = num_re * num_re + num_im * num_im;
        let den = den_re * den_re + den_im * den_im;
        10.0 * (num / den).log10()
    }
}

/// One designed biquad stage
///
/// Immutable once built. Holds the design parameters next to the derived
/// coefficients so a stage can be inspected or reported.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterStage {
    filter_type: FilterType,
    gain_db: f64,
    q: f64,
    center_hz: f64,
    sample_rate: f64,
    passband_gain: f64,
    coefficients: Coefficients,
}

impl FilterStage {
    pub fn filter_type(&self) -> FilterType {
        self.filter_type
    }

    pub fn gain_db(&self) -> f64 {
        self.gain_db
    }

    pub fn q(&self) -> f64 {
        self.q
    }

    pub fn center_hz(&self) -> f64 {
        self.center_hz
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Linear gain applied to the stage output (1.0 = unity)
    pub fn passband_gain(&self) -> f64 {
        self.passband_gain
    }

    pub fn coefficients(&self) -> &Coefficients {
        &self.coefficients
    }

    /// Return a copy of this stage with a different output gain
    ///
    /// # Errors
    /// Returns error if the gain is not finite
    pub fn with_passband_gain(mut self, passband_gain: f64) -> Result<Self> {
        if !passband_gain.is_finite() {
            return Err(LoudnessError::InvalidParameter(format!(
                "passband gain must be finite, got {passband_gain}"
            )));
        }
        self.passband_gain = passband_gain;
        Ok(self)
    }
}

impl fmt::Display for FilterStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = &self.coefficients;
        writeln!(f, "------------------------------")?;
        writeln!(f, "type: {}", self.filter_type)?;
        writeln!(f, "------------------------------")?;
        writeln!(f, "Gain          = {} dB", self.gain_db)?;
        writeln!(f, "Q factor      = {}", self.q)?;
        writeln!(f, "Center freq.  = {} Hz", self.center_hz)?;
        writeln!(f, "Sample rate   = {} Hz", self.sample_rate)?;
        writeln!(f, "Passband gain = {}", self.passband_gain)?;
        writeln!(f, "------------------------------")?;
        writeln!(f, "b0 = {}", c.b0)?;
        writeln!(f, "b1 = {}", c.b1)?;
        writeln!(f, "b2 = {}", c.b2)?;
        writeln!(f, "a0 = 1")?;
        writeln!(f, "a1 = {}", c.a1)?;
        writeln!(f, "a2 = {}", c.a2)?;
        write!(f, "------------------------------")
    }
}

/// Design a biquad stage
///
/// # Arguments
/// * `gain_db` - Shelf/peak gain in dB (ignored by pass and notch types)
/// * `q` - Quality factor, must be positive
/// * `center_hz` - Corner or centre frequency, must be below Nyquist
/// * `sample_rate` - Sample rate in Hz, must be positive
/// * `filter_type` - Stage shape
///
/// # Errors
/// Returns `InvalidSampleRate` or `InvalidParameter` when the inputs do
/// not describe a stable, well-defined response.
pub fn make_filter(
    gain_db: f64,
    q: f64,
    center_hz: f64,
    sample_rate: f64,
    filter_type: FilterType,
) -> Result<FilterStage> {
    if !(sample_rate.is_finite() && sample_rate > 0.0) {
        return Err(LoudnessError::InvalidSampleRate(sample_rate));
    }
    if !(q.is_finite() && q > 0.0) {
        return Err(LoudnessError::InvalidParameter(format!(
            "Q must be positive, got {q}"
        )));
    }
    if !gain_db.is_finite() {
        return Err(LoudnessError::InvalidParameter(format!(
            "gain must be finite, got {gain_db} dB"
        )));
    }
    let nyquist = sample_rate / 2.0;
    if !(center_hz.is_finite() && center_hz > 0.0 && center_hz < nyquist) {
        return Err(LoudnessError::InvalidParameter(format!(
            "center frequency {center_hz} Hz must lie in (0, {nyquist}) Hz"
        )));
    }

    let coefficients = match filter_type {
        FilterType::HighShelfDeMan => deman_high_shelf(gain_db, q, center_hz, sample_rate),
        FilterType::HighPassDeMan => deman_high_pass(q, center_hz, sample_rate),
        FilterType::HighPass
        | FilterType::LowPass
        | FilterType::HighShelf
        | FilterType::LowShelf
        | FilterType::Peaking
        | FilterType::Notch => cookbook(filter_type, gain_db, q, center_hz, sample_rate),
    };

    Ok(FilterStage {
        filter_type,
        gain_db,
        q,
        center_hz,
        sample_rate,
        passband_gain: 1.0,
        coefficients,
    })
}

fn cookbook(
    filter_type: FilterType,
    gain_db: f64,
    q: f64,
    center_hz: f64,
    sample_rate: f64,
) -> Coefficients {
    let a = 10.0_f64.powf(gain_db / 40.0);
    let w0 = 2.0 * PI * center_hz / sample_rate;
    let cos_w0 = w0.cos();
    let alpha = w0.sin() / (2.0 * q);
    let two_sqrt_a_alpha = 2.0 * a.sqrt() * alpha;

    let (b, a_coef) = match filter_type {
        FilterType::HighShelf => (
            [
                a * ((a + 1.0) + (a - 1.0) * cos_w0 + two_sqrt_a_alpha),
                -2.0 * a * ((a - 1.0) + (a + 1.0) * cos_w0),
                a * ((a + 1.0) + (a - 1.0) * cos_w0 - two_sqrt_a_alpha),
            ],
            [
                (a + 1.0) - (a - 1.0) * cos_w0 + two_sqrt_a_alpha,
                2.0 * ((a - 1.0) - (a + 1.0) * cos_w0),
                (a + 1.0) - (a - 1.0) * cos_w0 - two_sqrt_a_alpha,
            ],
        ),
        FilterType::LowShelf => (
            [
                a * ((a + 1.0) - (a - 1.0) * cos_w0 + two_sqrt_a_alpha),
                2.0 * a * ((a - 1.0) - (a + 1.0) * cos_w0),
                a * ((a + 1.0) - (a - 1.0) * cos_w0 - two_sqrt_a_alpha),
            ],
            [
                (a + 1.0) + (a - 1.0) * cos_w0 + two_sqrt_a_alpha,
                -2.0 * ((a - 1.0) + (a + 1.0) * cos_w0),
                (a + 1.0) + (a - 1.0) * cos_w0 - two_sqrt_a_alpha,
            ],
        ),
        FilterType::HighPass => (
            [(1.0 + cos_w0) / 2.0, -(1.0 + cos_w0), (1.0 + cos_w0) / 2.0],
            [1.0 + alpha, -2.0 * cos_w0, 1.0 - alpha],
        ),
        FilterType::LowPass => (
            [(1.0 - cos_w0) / 2.0, 1.0 - cos_w0, (1.0 - cos_w0) / 2.0],
            [1.0 + alpha, -2.0 * cos_w0, 1.0 - alpha],
        ),
        FilterType::Peaking => (
            [1.0 + alpha * a, -2.0 * cos_w0, 1.0 - alpha * a],
            [1.0 + alpha / a, -2.0 * cos_w0, 1.0 - alpha / a],
        ),
        FilterType::Notch => (
            [1.0, -2.0 * cos_w0, 1.0],
            [1.0 + alpha, -2.0 * cos_w0, 1.0 - alpha],
        ),
        FilterType::HighShelfDeMan | FilterType::HighPassDeMan => {
            unreachable!("bilinear-transform stages are designed by make_filter")
        }
    };

    Coefficients::normalized(b, a_coef)
}

fn deman_high_shelf(gain_db: f64, q: f64, center_hz: f64, sample_rate: f64) -> Coefficients {
    let k = (PI * center_hz / sample_rate).tan();
    let vh = 10.0_f64.powf(gain_db / 20.0);
    let vb = vh.powf(DEMAN_SHELF_VB_EXPONENT);
    let k2 = k * k;

    Coefficients::normalized(
        [vh + vb * k / q + k2, 2.0 * (k2 - vh), vh - vb * k / q + k2],
        [1.0 + k / q + k2, 2.0 * (k2 - 1.0), 1.0 - k / q + k2],
    )
}

fn deman_high_pass(q: f64, center_hz: f64, sample_rate: f64) -> Coefficients {
    let k = (PI * center_hz / sample_rate).tan();
    let k2 = k * k;
    let a0 = 1.0 + k / q + k2;

    // Numerator stays at (1, -2, 1), only the denominator is normalised
    Coefficients {
        b0: 1.0,
        b1: -2.0,
        b2: 1.0,
        a1: 2.0 * (k2 - 1.0) / a0,
        a2: (k2 - k / q + 1.0) / a0,
    }
}
