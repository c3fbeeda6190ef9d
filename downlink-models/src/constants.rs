/// Default platform envelope version.
pub const DEFAULT_ENVELOPE_VERSION: &str = "1.0.0";

/// Method name for property-set commands.
pub const METHOD_PROPERTY_SET: &str = "thing.service.property.set";

/// Audit record kind for property-set dispatches.
pub const MSG_TYPE_PROPERTY_SET: &str = "property_set";

/// Publish topic template for property-set commands.
///
/// `{productKey}` and `{deviceKey}` are substituted with the physical
/// target's keys at dispatch time.
pub const PROPERTY_SET_TOPIC: &str = "/sys/{productKey}/{deviceKey}/thing/service/property/set";

/// Substitute `{productKey}` / `{deviceKey}` placeholders in a topic
/// template.
pub fn render_topic(template: &str, product_key: &str, device_key: &str) -> String {
    template
        .replace("{productKey}", product_key)
        .replace("{deviceKey}", device_key)
}
