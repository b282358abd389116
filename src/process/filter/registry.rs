use ::std::collections::HashMap;
use ::std::error::Error;
use ::std::fmt::Debug;
use ::std::sync::Arc;

use crate::object::direct::dictionary::Dictionary;
use crate::object::direct::name::Name;
use crate::Byte;

pub type CodecError = Box<dyn Error + Send + Sync>;

/// A decoder and encoder for one filter name, supplied by the caller, e.g.
/// an image codec for `/DCTDecode`. The payloads are opaque to the
/// pipeline.
pub trait Codec: Debug + Send + Sync {
    fn decode(&self, bytes: &[Byte], parms: Option<&Dictionary>) -> Result<Vec<Byte>, CodecError>;

    fn encode(&self, bytes: &[Byte], parms: Option<&Dictionary>) -> Result<Vec<Byte>, CodecError>;
}

/// Codecs by filter name. Each document owns its registry. A registered
/// codec takes precedence over the built-in filter of the same name.
#[derive(Debug, Clone, Default)]
pub struct FilterRegistry {
    codecs: HashMap<Name, Arc<dyn Codec>>,
}

impl FilterRegistry {
    pub fn register(&mut self, name: impl Into<Name>, codec: Arc<dyn Codec>) -> &mut Self {
        self.codecs.insert(name.into(), codec);
        self
    }

    pub fn get(&self, name: &Name) -> Option<Arc<dyn Codec>> {
        self.codecs.get(name).cloned()
    }

    pub fn is_empty(&self) -> bool {
        self.codecs.is_empty()
    }
}
