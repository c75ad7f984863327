use std::fmt;

/// 信号名と単位だけを設定する用のタプル
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigDef(String, String); // (信号名, 単位)

impl SigDef {
    pub fn new(name: impl Into<String>, unit: impl Into<String>) -> Self {
        Self(name.into(), unit.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    pub fn unit(&self) -> &str {
        &self.1
    }
}

impl fmt::Display for SigDef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}[{}]", self.0, self.1)
    }
}

/// (信号名, 単位) の並びから Vec<SigDef> を作る
#[macro_export]
macro_rules! MakeSigList {
    ($(($name:expr, $unit:expr)),* $(,)?) => {
        vec![$($crate::simcore::sim_signal::signal::SigDef::new($name, $unit)),*]
    };
}

#[cfg(test)]
mod sim_signals_test {
    use super::*;

    #[test]
    fn sigdef_test() {
        let sig = SigDef::new("orifice_flow", "m3/s");

        assert_eq!(sig.name(), "orifice_flow");
        assert_eq!(sig.unit(), "m3/s");
        assert_eq!(format!("{}", sig), "orifice_flow[m3/s]");
    }

    #[test]
    fn makesiglist_test() {
        let list = crate::MakeSigList![("time", "s"), ("pressure", "bar")];

        assert_eq!(list, vec![SigDef::new("time", "s"), SigDef::new("pressure", "bar")]);
    }
}
