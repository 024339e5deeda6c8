#[macro_export]
macro_rules! dummy {
    ($t:expr) => {
        ()
    };
}

/// Defines an enum over a family of register groups which all start with a
/// `SIDH` register.
#[macro_export]
macro_rules! buffer_def {
    (
        $(#[doc = $doc:expr])*
        $name:ident => {
            $(
                $(#[doc = $buf_doc:expr])*
                $buf:ident => $sidh:expr
            ),*
        }
    ) => {
        $(#[doc = $doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        #[cfg_attr(feature = "defmt", derive(defmt::Format))]
        #[cfg_attr(feature = "ufmt", derive(ufmt::derive::uDebug))]
        pub enum $name {
            $(
                $(#[doc = $buf_doc])*
                $buf,
            )*
        }

        impl $name {
            #[doc = concat!("All valid options for [`", stringify!($name), "`].")]
            pub const ALL: [Self; <[_]>::len(&[$($crate::dummy!($buf)),*])] = [$(Self::$buf),*];

            #[doc = concat!("Returns the `SIDH` register of the [`", stringify!($name), "`] variant. `SIDL`, `EID8` and `EID0` follow it.")]
            pub const fn sidh(self) -> $crate::regs::Register {
                match self {
                    $(Self::$buf => $sidh,)*
                }
            }
        }
    };
}
