//! Runtime geometry options
//!
//! The geometry and arm mode can be patched at runtime with single letter
//! option words, e.g. `T150 P150 A1 C128`.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info};
use std::collections::BTreeMap;

// Internal
use super::{ArmGeometry, ArmMode, KinCtrl, KinCtrlError};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Option key for the inner arm length in millimeters.
pub const OPT_ARM1_LENGTH: char = 'T';

/// Option key for the outer arm length in millimeters.
pub const OPT_ARM2_LENGTH: char = 'P';

/// Option key for the arm mode flag, non-zero for the default mode.
pub const OPT_ARM_MODE: char = 'A';

/// Option key for the Z travel per rotation in millimeters.
pub const OPT_Z_MM_PER_ROTATION: char = 'C';

// ---------------------------------------------------------------------------
// TYPES
// ---------------------------------------------------------------------------

/// Option words keyed by their letter.
pub type ArmOptions = BTreeMap<char, f64>;

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl KinCtrl {
    /// Apply option words to the geometry and arm mode.
    ///
    /// The options are applied to a copy of the geometry which is validated
    /// before it replaces the live one, so on error nothing changes. Unknown
    /// keys are ignored.
    pub fn set_optional(&mut self, options: &ArmOptions) -> Result<(), KinCtrlError> {
        let mut params = self.geometry.to_params();
        let mut arm_mode = self.arm_mode;

        for (&key, &value) in options.iter() {
            match key {
                OPT_ARM1_LENGTH => params.arm1_length_mm = value,
                OPT_ARM2_LENGTH => params.arm2_length_mm = value,
                OPT_Z_MM_PER_ROTATION => params.z_mm_per_rotation = value,
                OPT_ARM_MODE => {
                    if !value.is_finite() {
                        return Err(KinCtrlError::InvalidGeometry(format!(
                            "arm mode flag must be finite, found {}",
                            value
                        )));
                    }
                    arm_mode = ArmMode::from_flag(value)
                }
                _ => debug!("Ignoring unknown kinematics option {}{}", key, value),
            }
        }

        self.geometry = ArmGeometry::new(&params)?;
        self.arm_mode = arm_mode;

        info!(
            "Kinematics options set: {}",
            format_options(&self.get_optional())
        );

        Ok(())
    }

    /// Get the current value of every option.
    pub fn get_optional(&self) -> ArmOptions {
        let mut options = ArmOptions::new();

        options.insert(OPT_ARM1_LENGTH, self.geometry.arm1_length_mm());
        options.insert(OPT_ARM2_LENGTH, self.geometry.arm2_length_mm());
        options.insert(OPT_ARM_MODE, self.arm_mode.as_flag());
        options.insert(OPT_Z_MM_PER_ROTATION, self.geometry.z_mm_per_rotation());

        options
    }
}

/// Format options as space separated option words.
pub fn format_options(options: &ArmOptions) -> String {
    options
        .iter()
        .map(|(k, v)| format!("{}{}", k, v))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::kin_ctrl::Params;

    #[test]
    fn test_get_optional() {
        let kin = KinCtrl::new(&Params::default()).unwrap();
        let opts = kin.get_optional();

        assert_eq!(opts.len(), 4);
        assert_eq!(opts[&'T'], 150.0);
        assert_eq!(opts[&'P'], 150.0);
        assert_eq!(opts[&'A'], 1.0);
        assert_eq!(opts[&'C'], 128.0);
        assert_eq!(format_options(&opts), "A1 C128 P150 T150");
    }

    #[test]
    fn test_set_optional() {
        let mut kin = KinCtrl::new(&Params::default()).unwrap();

        let mut opts = ArmOptions::new();
        opts.insert('T', 160.0);
        opts.insert('P', 140.0);
        opts.insert('A', 0.0);
        opts.insert('C', 64.0);
        opts.insert('X', 12.0);
        kin.set_optional(&opts).unwrap();

        assert_eq!(kin.geometry().arm1_length_mm(), 160.0);
        assert_eq!(kin.geometry().arm2_length_mm(), 140.0);
        assert_eq!(kin.geometry().z_mm_per_rotation(), 64.0);
        assert_eq!(kin.arm_mode(), ArmMode::Alternate);
        assert!(!kin.get_optional().contains_key(&'X'));
    }

    #[test]
    fn test_set_optional_is_atomic() {
        let mut kin = KinCtrl::new(&Params::default()).unwrap();

        // Valid mode change together with an invalid length
        let mut opts = ArmOptions::new();
        opts.insert('A', 0.0);
        opts.insert('T', -5.0);

        assert!(matches!(
            kin.set_optional(&opts),
            Err(KinCtrlError::InvalidGeometry(_))
        ));
        assert_eq!(kin.get_optional(), KinCtrl::new(&Params::default()).unwrap().get_optional());
    }
}
