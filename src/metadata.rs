//! Capability document printed by `describe`

/// Provider description. YAML, not JSON: the caller reads it before
/// choosing how to talk to the provider.
pub const METADATA: &str = "\
---
provider:
  type: package
  invoke: json
  actions: [set, get]
  suitable:
    commands: [dnf]
  attributes:
    name:
      desc: the name of the package
    ensure:
      desc: what state the package should be in
      # one of present, installed, absent, purged, held, latest,
      # or a version string
      type: string
    platform:
      desc: the platform (architecture) for which the package was built
      kind: r
";
