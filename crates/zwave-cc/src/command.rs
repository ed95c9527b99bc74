//! The closed set of commands this crate can build or receive.

use crate::cc::basic::{BasicGet, BasicReport, BasicSet};
use crate::cc::color_switch::{
    ColorSwitchGet, ColorSwitchReport, ColorSwitchSet, ColorSwitchSupportedGet,
    ColorSwitchSupportedReport,
};
use crate::cc::configuration::{
    ConfigurationBulkGet, ConfigurationBulkReport, ConfigurationDefaultReset, ConfigurationGet,
    ConfigurationInfoGet, ConfigurationInfoReport, ConfigurationNameGet, ConfigurationNameReport,
    ConfigurationPropertiesGet, ConfigurationPropertiesReport, ConfigurationReport,
    ConfigurationSet,
};
use crate::cc::multi_channel::MultiChannelEncapsulation;
use crate::cc::multi_command::MultiCommandEncapsulation;
use crate::cc::scene_actuator_conf::{
    SceneActuatorConfGet, SceneActuatorConfReport, SceneActuatorConfSet,
};
use crate::cc::security2::{Security2MessageEncapsulation, Security2NonceGet, Security2NonceReport};
use crate::cc::supervision::{SupervisionGet, SupervisionReport};
use crate::codec::{CcCommand, SerializeCommand, SerializeContext};
use crate::encapsulation::Encapsulation;
use crate::error::EncodeError;
use crate::frame::{encode_frame, CcId, Frame, PeerAddress};
use crate::log::{LogEntry, LogFields};
use crate::persist::{Persist, PersistContext};
use tracing::trace;
use zwave_metrics::{metric_defs, metrics, MetricLabels};

macro_rules! define_commands {
    ($($(#[$meta:meta])* $variant:ident($ty:ty)),* $(,)?) => {
        /// A parsed or buildable command.
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub enum Command {
            $($(#[$meta])* $variant($ty),)*
        }

        $(
            impl From<$ty> for Command {
                fn from(cmd: $ty) -> Self {
                    Command::$variant(cmd)
                }
            }
        )*

        impl Command {
            /// Command class id.
            pub fn cc_id(&self) -> CcId {
                match self {
                    $(Command::$variant(_) => <$ty as CcCommand>::CC_ID,)*
                }
            }

            /// Command id within the command class.
            pub fn command(&self) -> u8 {
                match self {
                    $(Command::$variant(_) => <$ty as CcCommand>::COMMAND,)*
                }
            }

            /// Command name for logs.
            pub fn name(&self) -> &'static str {
                match self {
                    $(Command::$variant(_) => <$ty as CcCommand>::NAME,)*
                }
            }

            /// Serialize the payload after the CC header.
            pub fn serialize_payload(&self, ctx: &SerializeContext<'_>) -> Result<Vec<u8>, EncodeError> {
                match self {
                    $(Command::$variant(cmd) => cmd.serialize(ctx),)*
                }
            }

            fn log_fields(&self) -> Vec<(&'static str, String)> {
                match self {
                    $(Command::$variant(cmd) => cmd.log_fields(),)*
                }
            }
        }

        impl Persist for Command {
            fn persist(&mut self, ctx: &mut PersistContext<'_>) {
                match self {
                    $(Command::$variant(cmd) => cmd.persist(ctx),)*
                }
            }
        }
    };
}

define_commands! {
    // Basic
    /// Basic Set.
    BasicSet(BasicSet),
    /// Basic Get.
    BasicGet(BasicGet),
    /// Basic Report.
    BasicReport(BasicReport),

    // Scene Actuator Configuration
    /// Scene Actuator Configuration Set.
    SceneActuatorConfSet(SceneActuatorConfSet),
    /// Scene Actuator Configuration Get.
    SceneActuatorConfGet(SceneActuatorConfGet),
    /// Scene Actuator Configuration Report.
    SceneActuatorConfReport(SceneActuatorConfReport),

    // Color Switch
    /// Color Switch Supported Get.
    ColorSwitchSupportedGet(ColorSwitchSupportedGet),
    /// Color Switch Supported Report.
    ColorSwitchSupportedReport(ColorSwitchSupportedReport),
    /// Color Switch Get.
    ColorSwitchGet(ColorSwitchGet),
    /// Color Switch Report.
    ColorSwitchReport(ColorSwitchReport),
    /// Color Switch Set.
    ColorSwitchSet(ColorSwitchSet),

    // Configuration
    /// Configuration Set.
    ConfigurationSet(ConfigurationSet),
    /// Configuration Get.
    ConfigurationGet(ConfigurationGet),
    /// Configuration Report.
    ConfigurationReport(ConfigurationReport),
    /// Configuration Bulk Get.
    ConfigurationBulkGet(ConfigurationBulkGet),
    /// Configuration Bulk Report.
    ConfigurationBulkReport(ConfigurationBulkReport),
    /// Configuration Name Get.
    ConfigurationNameGet(ConfigurationNameGet),
    /// Configuration Name Report.
    ConfigurationNameReport(ConfigurationNameReport),
    /// Configuration Info Get.
    ConfigurationInfoGet(ConfigurationInfoGet),
    /// Configuration Info Report.
    ConfigurationInfoReport(ConfigurationInfoReport),
    /// Configuration Properties Get.
    ConfigurationPropertiesGet(ConfigurationPropertiesGet),
    /// Configuration Properties Report.
    ConfigurationPropertiesReport(ConfigurationPropertiesReport),
    /// Configuration Default Reset.
    ConfigurationDefaultReset(ConfigurationDefaultReset),

    // Supervision
    /// Supervision Get.
    SupervisionGet(SupervisionGet),
    /// Supervision Report.
    SupervisionReport(SupervisionReport),

    // Encapsulation
    /// Multi Channel Command Encapsulation.
    MultiChannelEncapsulation(MultiChannelEncapsulation),
    /// Multi Command Encapsulation.
    MultiCommandEncapsulation(MultiCommandEncapsulation),

    // Security 2
    /// Security 2 Nonce Get.
    Security2NonceGet(Security2NonceGet),
    /// Security 2 Nonce Report.
    Security2NonceReport(Security2NonceReport),
    /// Security 2 Message Encapsulation.
    Security2MessageEncapsulation(Security2MessageEncapsulation),
}

impl Command {
    /// Serialize to a complete frame: CC header followed by the payload.
    ///
    /// Encapsulated children are serialized first and embedded in their
    /// parent's payload.
    pub fn encode(&self, ctx: &SerializeContext<'_>) -> Result<Vec<u8>, EncodeError> {
        let payload = self.serialize_payload(ctx)?;
        Ok(encode_frame(self.cc_id(), self.command(), &payload))
    }

    /// Serialize into a [`Frame`] addressed to `peer`.
    pub fn to_frame(&self, ctx: &SerializeContext<'_>, peer: PeerAddress) -> Result<Frame, EncodeError> {
        let payload = self.serialize_payload(ctx)?;
        Ok(Frame::new(self.cc_id(), self.command(), payload, peer))
    }

    /// Persist the command's values and return how many were written.
    ///
    /// Run only on fully parsed and, for partial reports, merged commands.
    pub fn persist_values(&mut self, ctx: &mut PersistContext<'_>) -> usize {
        let before = ctx.persisted();
        self.persist(ctx);
        let written = ctx.persisted() - before;

        if written > 0 {
            let peer = ctx.peer();
            trace!("Persisted {} value(s) of {} from {}", written, self.name(), peer);
            let labels = MetricLabels::new(peer.node_id, self.cc_id().name()).with_endpoint(peer.endpoint);
            metrics::counter!(metric_defs::CC_VALUES_PERSISTED.name, &labels.to_labels())
                .increment(written as u64);
        }
        written
    }

    /// Diagnostic record of the command and everything it encapsulates.
    pub fn log_entry(&self) -> LogEntry {
        let encapsulated = match self.encapsulation() {
            Encapsulation::Encapsulates(child) => vec![child.log_entry()],
            Encapsulation::EncapsulatesMany(children) => children.iter().map(Command::log_entry).collect(),
            Encapsulation::Leaf => Vec::new(),
        };
        LogEntry {
            name: self.name(),
            fields: self.log_fields(),
            encapsulated,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::CcVersions;
    use crate::numeric::Duration;
    use crate::values::MemoryValueStore;

    #[test]
    fn test_identity_dispatch() {
        let cmd = Command::from(ConfigurationGet::new(3));
        assert_eq!(cmd.cc_id(), CcId::CONFIGURATION);
        assert_eq!(cmd.command(), 0x05);
        assert_eq!(cmd.name(), "ConfigurationGet");
    }

    #[test]
    fn test_encode_prepends_header() {
        let versions = CcVersions::default();
        let ctx = SerializeContext::new(&versions);
        let cmd = Command::from(SceneActuatorConfGet::new(4));
        assert_eq!(cmd.encode(&ctx).unwrap(), vec![0x2C, 0x02, 4]);

        let frame = cmd.to_frame(&ctx, PeerAddress::new(7)).unwrap();
        assert_eq!(frame.payload(), &[4]);
        assert_eq!(frame.peer(), PeerAddress::new(7));
    }

    #[test]
    fn test_persist_values_counts() {
        let mut store = MemoryValueStore::new();
        let mut ctx = PersistContext::new(&mut store, PeerAddress::new(2));
        let mut report = Command::from(SceneActuatorConfReport {
            scene_id: 1,
            level: 10,
            dimming_duration: Duration::INSTANT,
        });
        assert_eq!(report.persist_values(&mut ctx), 2);

        let mut request = Command::from(SceneActuatorConfGet::new(1));
        assert_eq!(request.persist_values(&mut ctx), 0);
    }

    #[test]
    fn test_log_entry_nests() {
        let inner = Command::from(BasicSet::new(99).unwrap());
        let outer = Command::from(SupervisionGet::new(3, inner).unwrap());
        let entry = outer.log_entry();
        assert_eq!(entry.name, "SupervisionGet");
        assert_eq!(entry.field("session id"), Some("3"));
        assert_eq!(entry.encapsulated.len(), 1);
        assert_eq!(entry.encapsulated[0].field("target value"), Some("99"));
    }
}
