//! What gets installed next to the wheel, and the program that exercises it.

/// Visualisation dependency; version pinned through `VTK_VERSION`.
pub const VIS_DEPENDENCY: &str = "vtk";

/// Installed one per command, in this order, after the visualisation dependency.
pub const EXTRA_DEPENDENCIES: &[&str] = &["scipy", "mpi4py"];

/// Imports `plantbox`, reports where it loaded from and whether the bundled
/// Anagallis root-system parameters are on disk, then imports the VTK plotting
/// module. The existence check is printed, never asserted.
pub const VALIDATION_PROGRAM: &str = r#"
import os
import plantbox as pb
print("plantbox:", pb.__file__)
print("data_path:", pb.data_path())
rootsys = os.path.join(pb.data_path(), "structural", "rootsystem", "Anagallis_femina_Leitner_2010.xml")
print("rootsys exists:", os.path.exists(rootsys))
import plantbox.visualisation.vtk_plot as vp
print("vtk_plot:", vp.__file__)
"#;

/// pip requirement string for the visualisation dependency.
pub fn vis_requirement(version: Option<&str>) -> String {
    match version {
        Some(v) => format!("{VIS_DEPENDENCY}=={v}"),
        None => VIS_DEPENDENCY.to_string(),
    }
}
