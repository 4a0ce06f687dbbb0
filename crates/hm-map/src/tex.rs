//! Default TeX labels.

const KNOWN_LABELS: &[(&str, &str)] = &[
    ("nue", r"\nu_e"),
    ("numu", r"\nu_{\mu}"),
    ("nutau", r"\nu_{\tau}"),
    ("nuebar", r"\bar{\nu}_e"),
    ("numubar", r"\bar{\nu}_{\mu}"),
    ("nutaubar", r"\bar{\nu}_{\tau}"),
    ("nue_cc", r"\nu_e\ CC"),
    ("numu_cc", r"\nu_{\mu}\ CC"),
    ("nutau_cc", r"\nu_{\tau}\ CC"),
    ("nue_nc", r"\nu_e\ NC"),
    ("numu_nc", r"\nu_{\mu}\ NC"),
    ("nutau_nc", r"\nu_{\tau}\ NC"),
    ("nuebar_cc", r"\bar{\nu}_e\ CC"),
    ("numubar_cc", r"\bar{\nu}_{\mu}\ CC"),
    ("nutaubar_cc", r"\bar{\nu}_{\tau}\ CC"),
    ("nuebar_nc", r"\bar{\nu}_e\ NC"),
    ("numubar_nc", r"\bar{\nu}_{\mu}\ NC"),
    ("nutaubar_nc", r"\bar{\nu}_{\tau}\ NC"),
];

/// Label for a map called `name`: a neutrino flavour/interaction symbol when the name is one
/// of the known ones, otherwise `\rm{name}`.
pub fn default_map_label(name: &str) -> String {
    KNOWN_LABELS
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, tex)| tex.to_string())
        .unwrap_or_else(|| format!(r"\rm{{{}}}", name))
}

/// Label for a collection called `name`.
pub fn default_set_label(name: Option<&str>) -> String {
    format!(r"{{\rm {}}}", name.unwrap_or("None"))
}
