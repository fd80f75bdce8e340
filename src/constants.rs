#[macro_export]
macro_rules! env_lazy {
    ($( $vis:vis $name:ident : $ty:ty = ($key:literal, $default:expr); )* ) => {
        $(
            $vis static $name: ::std::sync::LazyLock<$ty> = ::std::sync::LazyLock::new(|| {
                $crate::libs::config::load_env();
                $crate::libs::config::Config::get_var_t::<$ty>($key, $default)
            });
        )*
    };
}

env_lazy! {
    pub RECEIPT_POLL_MS: u64   = ("RECEIPT_POLL_MS", 500);
    pub RECEIPT_MAX_POLLS: u32 = ("RECEIPT_MAX_POLLS", 240);
    pub DEPLOY_GAS: u64        = ("DEPLOY_GAS", basketgame::DEFAULT_DEPLOY_GAS);
}

/// Shown in result fields when the contract has no game under the id.
pub const PLACEHOLDER: &str = "---";
