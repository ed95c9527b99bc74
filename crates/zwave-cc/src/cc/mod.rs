//! Concrete command classes.
//!
//! Each module holds the commands of one command class, the value kinds
//! they persist, and the response predicates they declare.

pub mod basic;
pub mod color_switch;
pub mod configuration;
pub mod multi_channel;
pub mod multi_command;
pub mod scene_actuator_conf;
pub mod security2;
pub mod supervision;

use crate::registry::CodecRegistryBuilder;

use basic::{BasicGet, BasicReport, BasicSet};
use color_switch::{
    ColorSwitchGet, ColorSwitchReport, ColorSwitchSet, ColorSwitchSupportedGet,
    ColorSwitchSupportedReport,
};
use configuration::{
    ConfigurationBulkGet, ConfigurationBulkReport, ConfigurationDefaultReset, ConfigurationGet,
    ConfigurationInfoGet, ConfigurationInfoReport, ConfigurationNameGet, ConfigurationNameReport,
    ConfigurationPropertiesGet, ConfigurationPropertiesReport, ConfigurationReport,
    ConfigurationSet,
};
use multi_channel::MultiChannelEncapsulation;
use multi_command::MultiCommandEncapsulation;
use scene_actuator_conf::{SceneActuatorConfGet, SceneActuatorConfReport, SceneActuatorConfSet};
use security2::{Security2MessageEncapsulation, Security2NonceGet, Security2NonceReport};
use supervision::{SupervisionGet, SupervisionReport};

/// Register every command of every command class in this module.
pub fn register_all(builder: CodecRegistryBuilder) -> CodecRegistryBuilder {
    builder
        // Basic
        .bidirectional::<BasicSet>()
        .outbound::<BasicGet>()
        .bidirectional::<BasicReport>()
        // Scene Actuator Configuration
        .outbound::<SceneActuatorConfSet>()
        .outbound::<SceneActuatorConfGet>()
        .bidirectional::<SceneActuatorConfReport>()
        // Color Switch
        .outbound::<ColorSwitchSupportedGet>()
        .bidirectional::<ColorSwitchSupportedReport>()
        .outbound::<ColorSwitchGet>()
        .bidirectional::<ColorSwitchReport>()
        .outbound::<ColorSwitchSet>()
        // Configuration
        .outbound::<ConfigurationSet>()
        .outbound::<ConfigurationGet>()
        .bidirectional::<ConfigurationReport>()
        .outbound::<ConfigurationBulkGet>()
        .bidirectional::<ConfigurationBulkReport>()
        .outbound::<ConfigurationNameGet>()
        .bidirectional::<ConfigurationNameReport>()
        .outbound::<ConfigurationInfoGet>()
        .bidirectional::<ConfigurationInfoReport>()
        .outbound::<ConfigurationPropertiesGet>()
        .bidirectional::<ConfigurationPropertiesReport>()
        .outbound::<ConfigurationDefaultReset>()
        // Supervision
        .bidirectional::<SupervisionGet>()
        .bidirectional::<SupervisionReport>()
        // Encapsulation
        .bidirectional::<MultiChannelEncapsulation>()
        .bidirectional::<MultiCommandEncapsulation>()
        // Security 2
        .bidirectional::<Security2NonceGet>()
        .bidirectional::<Security2NonceReport>()
        .bidirectional::<Security2MessageEncapsulation>()
}
